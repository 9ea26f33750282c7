// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Foreground extraction capability
//!
//! - `u2net` - salient-object segmentation on ONNX Runtime
//! - `command` - adapter for external tools that only work on files

pub mod command;
pub mod u2net;

pub use command::CommandExtractor;
pub use u2net::{U2NetExtractor, U2NetExtractorConfig};

use image::RgbaImage;

/// Foreground extractor capability
///
/// Returns an image of identical dimensions whose alpha channel marks the
/// foreground (255) and background (0). Calls are blocking.
pub trait ForegroundExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, image: &RgbaImage) -> anyhow::Result<RgbaImage>;
}

/// Copy a grayscale mask of the source size into the alpha channel
pub(crate) fn apply_alpha_mask(image: &RgbaImage, mask: &image::GrayImage) -> RgbaImage {
    let mut output = image.clone();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        pixel[3] = mask.get_pixel(x, y)[0];
    }
    output
}
