// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Normalizes detector-native output into `Detection`s

use anyhow::Result;
use tracing::debug;

use super::types::{BoundingBox, Detection, IsolatedImage};
use crate::vision::{DetectionParams, Detector, RawDetection};

/// Run the detector once and normalize its output
///
/// Thresholds are applied by the detector, not here.
pub fn detect(
    detector: &dyn Detector,
    image: &IsolatedImage,
    params: &DetectionParams,
) -> Result<Vec<Detection>> {
    let (width, height) = image.dimensions();
    let raw = detector.detect(image.as_rgb(), params)?;
    debug!("Detector '{}' returned {} detections", detector.name(), raw.len());

    Ok(raw
        .into_iter()
        .map(|r| normalize(r, width, height))
        .collect())
}

/// Convert one raw detection into image-space, bounded form
///
/// Class indices that do not fit a `u32` become `u32::MAX`, which no catalog
/// entry uses, so they are counted as unknown rather than dropped.
pub fn normalize(raw: RawDetection, width: u32, height: u32) -> Detection {
    let confidence = if raw.score.is_finite() {
        raw.score.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let [x1, y1, x2, y2] = raw.bbox.map(|v| if v.is_finite() { v } else { 0.0 });
    let (max_x, max_y) = (width as f32, height as f32);

    Detection {
        class_id: u32::try_from(raw.class_index).unwrap_or(u32::MAX),
        confidence,
        bbox: BoundingBox {
            x_min: x1.min(x2).clamp(0.0, max_x),
            y_min: y1.min(y2).clamp(0.0, max_y),
            x_max: x1.max(x2).clamp(0.0, max_x),
            y_max: y1.max(y2).clamp(0.0, max_y),
        },
    }
}
