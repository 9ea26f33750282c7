// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Draws detections onto a copy of the isolated image and encodes it

use ab_glyph::{FontArc, PxScale};
use anyhow::Context;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;

use super::types::{AnnotatedImage, Detection, IsolatedImage};
use crate::catalog::CategoryCatalog;
use crate::vision::image_utils::{encode_jpeg, ImageError};

/// High but lossy
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const MIN_FONT_SIZE: f32 = 12.0;

/// Box colours, indexed by class id
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

pub fn class_color(class_id: u32) -> Rgb<u8> {
    Rgb(PALETTE[class_id as usize % PALETTE.len()])
}

/// Stroke width scaled to the image size, at least 2px
pub fn line_width(width: u32, height: u32) -> u32 {
    (((width + height) as f32 / 2.0 * 0.003).round() as u32).max(2)
}

#[derive(Clone)]
pub struct Annotator {
    jpeg_quality: u8,
    font: Option<FontArc>,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("jpeg_quality", &self.jpeg_quality)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl Annotator {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
            font: None,
        }
    }

    /// Print `<key> <confidence>` tags with this font
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn load_font(path: &Path) -> anyhow::Result<FontArc> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read label font {}", path.display()))?;
        FontArc::try_from_vec(data)
            .with_context(|| format!("Invalid label font {}", path.display()))
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Draw every detection in order on a private copy, then encode as JPEG
    pub fn annotate(
        &self,
        image: &IsolatedImage,
        detections: &[Detection],
        catalog: &CategoryCatalog,
    ) -> Result<AnnotatedImage, ImageError> {
        let mut canvas = image.as_rgb().clone();
        let (width, height) = canvas.dimensions();
        let stroke = line_width(width, height);

        for detection in detections {
            let color = class_color(detection.class_id);
            let Some((x, y, w, h)) = pixel_box(detection, width, height) else {
                continue;
            };
            draw_box(&mut canvas, x, y, w, h, stroke, color);

            if let Some(font) = &self.font {
                let label = format!(
                    "{} {:.2}",
                    catalog.resolve(detection.class_id).key(),
                    detection.confidence
                );
                draw_tag(&mut canvas, font, &label, x, y, stroke, color);
            }
        }

        let jpeg = encode_jpeg(&canvas, self.jpeg_quality)?;
        Ok(AnnotatedImage { jpeg, width, height })
    }
}

/// Integer pixel rectangle `(x, y, w, h)` inside the image, `None` when degenerate
fn pixel_box(detection: &Detection, width: u32, height: u32) -> Option<(i32, i32, u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let bbox = &detection.bbox;
    let x_min = (bbox.x_min.floor() as i64).clamp(0, width as i64 - 1);
    let y_min = (bbox.y_min.floor() as i64).clamp(0, height as i64 - 1);
    let x_max = (bbox.x_max.ceil() as i64).clamp(0, width as i64 - 1);
    let y_max = (bbox.y_max.ceil() as i64).clamp(0, height as i64 - 1);

    if x_max <= x_min || y_max <= y_min {
        return None;
    }
    Some((
        x_min as i32,
        y_min as i32,
        (x_max - x_min + 1) as u32,
        (y_max - y_min + 1) as u32,
    ))
}

fn draw_box(canvas: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, stroke: u32, color: Rgb<u8>) {
    for t in 0..stroke {
        let inset_w = w.saturating_sub(2 * t);
        let inset_h = h.saturating_sub(2 * t);
        if inset_w == 0 || inset_h == 0 {
            break;
        }
        let rect = Rect::at(x + t as i32, y + t as i32).of_size(inset_w, inset_h);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

fn draw_tag(
    canvas: &mut RgbImage,
    font: &FontArc,
    label: &str,
    x: i32,
    y: i32,
    stroke: u32,
    color: Rgb<u8>,
) {
    let scale = PxScale::from((stroke as f32 * 6.0).max(MIN_FONT_SIZE));
    let (text_w, text_h) = text_size(scale, font, label);
    if text_w == 0 || text_h == 0 {
        return;
    }

    let tag_h = text_h + 2 * stroke;
    // Above the box when it fits, otherwise inside its top edge
    let tag_y = if y >= tag_h as i32 { y - tag_h as i32 } else { y };
    let tag_w = (text_w + 2 * stroke).min(canvas.width().saturating_sub(x.max(0) as u32));
    if tag_w == 0 {
        return;
    }

    draw_filled_rect_mut(canvas, Rect::at(x, tag_y).of_size(tag_w, tag_h), color);
    draw_text_mut(
        canvas,
        TEXT_COLOR,
        x + stroke as i32,
        tag_y + stroke as i32,
        scale,
        font,
        label,
    );
}
