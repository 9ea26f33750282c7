// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Foreground isolation onto a white canvas

use anyhow::Result;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use super::types::IsolatedImage;
use crate::vision::ForegroundExtractor;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Extract the foreground and flatten it over opaque white
pub fn isolate(extractor: &dyn ForegroundExtractor, image: &DynamicImage) -> Result<IsolatedImage> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    let foreground = extractor.extract(&rgba)?;
    if foreground.dimensions() != (width, height) {
        anyhow::bail!(
            "Extractor '{}' returned {}x{} for a {}x{} image",
            extractor.name(),
            foreground.width(),
            foreground.height(),
            width,
            height
        );
    }

    let mut canvas = RgbaImage::from_pixel(width, height, WHITE);
    imageops::overlay(&mut canvas, &foreground, 0, 0);

    debug!("Isolated {}x{} foreground with '{}'", width, height, extractor.name());

    Ok(IsolatedImage::new(DynamicImage::ImageRgba8(canvas).to_rgb8()))
}
