// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Data passed between pipeline stages

use image::RgbImage;
use std::collections::BTreeMap;

/// An upload as received, before any validation
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    /// Declared media type; empty when the client sent none
    pub content_type: String,
    pub filename: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            filename: None,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Foreground composited onto opaque white, same size as the decoded upload
#[derive(Debug, Clone, PartialEq)]
pub struct IsolatedImage(RgbImage);

impl IsolatedImage {
    pub fn new(image: RgbImage) -> Self {
        Self(image)
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// `[x_min, y_min, x_max, y_max]` in isolated-image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    /// In `[0, 1]`
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Per-category counts and the detections they were derived from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSummary {
    pub(crate) counts: BTreeMap<String, usize>,
    pub(crate) detections: Vec<Detection>,
}

impl DetectionSummary {
    /// Count for a category key, zero when never observed
    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Observed categories only
    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Encoded JPEG of the isolated image with detections drawn
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Successful pipeline outcome
#[derive(Debug, Clone)]
pub struct Prediction {
    pub summary: DetectionSummary,
    pub annotated: AnnotatedImage,
}
