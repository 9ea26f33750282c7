// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! External-tool foreground extractor
//!
//! Some background-removal tools only operate on files. The input is written
//! as PNG into a per-call temporary directory, the command is run with the
//! `{input}` and `{output}` placeholders substituted, and the output PNG is
//! read back. The directory is removed when the call returns.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use super::ForegroundExtractor;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    /// Parse a whitespace-separated command template
    ///
    /// The template must name both `{input}` and `{output}`.
    pub fn from_template(template: &str) -> Result<Self> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .context("Extractor command template is empty")?;
        let args: Vec<String> = parts.collect();

        for placeholder in [INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER] {
            if !args.iter().any(|arg| arg.contains(placeholder)) {
                anyhow::bail!(
                    "Extractor command template must contain {}: {}",
                    placeholder,
                    template
                );
            }
        }

        Ok(Self { program, args })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn render_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

impl ForegroundExtractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.program
    }

    fn extract(&self, image: &RgbaImage) -> Result<RgbaImage> {
        let workdir = tempfile::tempdir().context("Failed to create extractor work directory")?;
        let input_path = workdir.path().join("input.png");
        let output_path = workdir.path().join("output.png");

        image
            .save_with_format(&input_path, image::ImageFormat::Png)
            .context("Failed to write extractor input")?;

        let args = self.render_args(&input_path, &output_path);
        debug!("Running extractor: {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run extractor command '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "Extractor command '{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
            anyhow::bail!("Extractor command exited with {}", output.status);
        }

        let result = image::open(&output_path)
            .context("Failed to read extractor output")?
            .to_rgba8();

        if result.dimensions() != image.dimensions() {
            anyhow::bail!(
                "Extractor output is {}x{}, expected {}x{}",
                result.width(),
                result.height(),
                image.width(),
                image.height()
            );
        }

        Ok(result)
    }
}
