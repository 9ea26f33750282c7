// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! U2-Net salient-object segmentation on ONNX Runtime

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, GrayImage, Luma, RgbaImage};
use ndarray::{Array4, ArrayViewD, Ix4};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{apply_alpha_mask, ForegroundExtractor};

/// U2-Net input resolution
pub const U2NET_INPUT_SIZE: u32 = 320;

/// Mean values for normalization (ImageNet)
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet)
const STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone)]
pub struct U2NetExtractorConfig {
    pub model_path: PathBuf,
    pub intra_threads: usize,
}

impl Default for U2NetExtractorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/u2net.onnx"),
            intra_threads: 4,
        }
    }
}

#[derive(Clone)]
pub struct U2NetExtractor {
    session: Arc<Mutex<Session>>,
    input_name: String,
}

impl std::fmt::Debug for U2NetExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("U2NetExtractor")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl U2NetExtractor {
    pub fn new(config: &U2NetExtractorConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();

        if !model_path.exists() {
            anyhow::bail!(
                "Segmentation model not found: {}",
                model_path.display()
            );
        }

        info!("Loading segmentation model from {}", model_path.display());

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
                "Failed to load segmentation model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input.1".to_string());

        info!("✅ Segmentation model loaded (input: {})", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    fn predict_mask(&self, image: &RgbaImage) -> Result<GrayImage> {
        let tensor = preprocess_for_segmentation(image);
        let input_value = Value::from_array(tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Segmentation session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Segmentation inference failed")?;

        let saliency = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract saliency map")?;

        debug!("Saliency map shape: {:?}", saliency.shape());

        saliency_to_mask(saliency.view(), image.width(), image.height())
    }
}

impl ForegroundExtractor for U2NetExtractor {
    fn name(&self) -> &str {
        "u2net"
    }

    fn extract(&self, image: &RgbaImage) -> Result<RgbaImage> {
        if image.width() == 0 || image.height() == 0 {
            anyhow::bail!("Cannot segment an empty image");
        }
        let mask = self.predict_mask(image)?;
        Ok(apply_alpha_mask(image, &mask))
    }
}

/// Resize to 320x320, scale by the brightest channel value, normalize with
/// ImageNet statistics, NCHW layout
pub fn preprocess_for_segmentation(image: &RgbaImage) -> Array4<f32> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let resized = image::imageops::resize(
        &rgb,
        U2NET_INPUT_SIZE,
        U2NET_INPUT_SIZE,
        FilterType::Lanczos3,
    );

    let max_value = resized.as_raw().iter().copied().max().unwrap_or(0).max(1) as f32;

    let side = U2NET_INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / max_value - MEAN[c]) / STD[c];
        }
    }

    tensor
}

/// Min-max normalize a `[1, 1, H, W]` saliency map and resize it to the source
pub fn saliency_to_mask(saliency: ArrayViewD<f32>, width: u32, height: u32) -> Result<GrayImage> {
    let shape = saliency.shape().to_vec();
    if shape.len() != 4 || shape[0] != 1 || shape[1] != 1 {
        anyhow::bail!("Unexpected saliency map shape: {:?}", shape);
    }
    let (map_h, map_w) = (shape[2], shape[3]);
    if map_h == 0 || map_w == 0 {
        anyhow::bail!("Empty saliency map: {:?}", shape);
    }
    let saliency = saliency.into_dimensionality::<Ix4>()?;

    let (min, max) = saliency
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = if max > min { max - min } else { 1.0 };

    let mut small = GrayImage::new(map_w as u32, map_h as u32);
    for (x, y, pixel) in small.enumerate_pixels_mut() {
        let v = (saliency[[0, 0, y as usize, x as usize]] - min) / range;
        *pixel = Luma([(v.clamp(0.0, 1.0) * 255.0).round() as u8]);
    }

    Ok(image::imageops::resize(&small, width, height, FilterType::Lanczos3))
}
