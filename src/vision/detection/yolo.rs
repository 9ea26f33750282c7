// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO object detector on ONNX Runtime
//!
//! Expects an Ultralytics ONNX export (`yolo export format=onnx`) with a
//! single `[1, 3, S, S]` input and a `[1, 4 + classes, anchors]` output.

use anyhow::{Context, Result};
use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::postprocess::{decode_yolo_output, Letterbox};
use super::{DetectionParams, Detector, RawDetection};

/// Ultralytics default export size
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Letterbox padding value used by Ultralytics
const PAD_VALUE: u8 = 114;

/// Settings for loading the detector
#[derive(Debug, Clone)]
pub struct YoloOnnxDetectorConfig {
    /// Path to the exported ONNX model
    pub model_path: PathBuf,
    /// Reported detector name; the model file stem when absent
    pub name: Option<String>,
    /// Square model input size
    pub input_size: u32,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for YoloOnnxDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/detector.onnx"),
            name: None,
            input_size: DEFAULT_INPUT_SIZE,
            intra_threads: 4,
        }
    }
}

/// YOLO detector backed by an ONNX Runtime session
///
/// Runs on the CPU execution provider.
#[derive(Clone)]
pub struct YoloOnnxDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    input_name: String,
    input_size: u32,
    name: String,
}

impl std::fmt::Debug for YoloOnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloOnnxDetector")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl YoloOnnxDetector {
    /// Load the detector model
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn new(config: &YoloOnnxDetectorConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("Detector model not found: {}", model_path.display());
        }
        if config.input_size == 0 {
            anyhow::bail!("Detector input size must be > 0");
        }

        info!("Loading detector model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detector model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let name = config
            .name
            .clone()
            .unwrap_or_else(|| model_stem(model_path));

        info!(
            "✅ Detector '{}' loaded (input: {}, size: {})",
            name, input_name, config.input_size
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size: config.input_size,
            name,
        })
    }

    fn run(&self, tensor: Array4<f32>, letterbox: &Letterbox, params: &DetectionParams) -> Result<Vec<RawDetection>> {
        let input_value = Value::from_array(tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detector session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detector output shape: {:?}", output_tensor.shape());

        decode_yolo_output(output_tensor.view(), letterbox, params)
    }
}

impl Detector for YoloOnnxDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, image: &RgbImage, params: &DetectionParams) -> Result<Vec<RawDetection>> {
        let (tensor, letterbox) = preprocess_letterbox(image, self.input_size);
        let detections = self.run(tensor, &letterbox, params)?;
        debug!("Detector returned {} detections", detections.len());
        Ok(detections)
    }
}

/// Letterbox into a `size`x`size` canvas and convert to a normalized NCHW tensor
///
/// Steps:
/// 1. Resize with aspect ratio preservation
/// 2. Center on a grey (114) canvas
/// 3. Scale pixels to [0, 1]
/// 4. Convert to NCHW tensor format [1, 3, S, S]
pub fn preprocess_letterbox(image: &RgbImage, size: u32) -> (Array4<f32>, Letterbox) {
    let letterbox = Letterbox::fit(image.width(), image.height(), size);
    let new_w = ((image.width() as f32 * letterbox.scale).round() as u32).clamp(1, size);
    let new_h = ((image.height() as f32 * letterbox.scale).round() as u32).clamp(1, size);

    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]));
    image::imageops::replace(
        &mut canvas,
        &resized,
        letterbox.pad_x as i64,
        letterbox.pad_y as i64,
    );

    let side = size as usize;
    let mut tensor = Array4::zeros((1, 3, side, side));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, letterbox)
}

fn model_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "detector".to_string())
}
