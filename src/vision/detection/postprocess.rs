// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of YOLO output tensors into detections

use anyhow::Result;
use ndarray::{ArrayViewD, Ix3};

use super::{DetectionParams, RawDetection};

/// Letterbox geometry used to map model-space boxes back to the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Model-space pixels per source pixel
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    /// Geometry for fitting `width`x`height` into a `target`x`target` square
    pub fn fit(width: u32, height: u32, target: u32) -> Self {
        let scale = if width == 0 || height == 0 {
            1.0
        } else {
            (target as f32 / width as f32).min(target as f32 / height as f32)
        };
        let new_w = (width as f32 * scale).round();
        let new_h = (height as f32 * scale).round();

        Self {
            scale,
            pad_x: ((target as f32 - new_w) / 2.0).floor(),
            pad_y: ((target as f32 - new_h) / 2.0).floor(),
            source_width: width,
            source_height: height,
        }
    }

    /// Model-space `[x1, y1, x2, y2]` → clamped source-space box
    pub fn unmap(&self, bbox: [f32; 4]) -> [f32; 4] {
        let max_x = self.source_width as f32;
        let max_y = self.source_height as f32;
        [
            ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, max_y),
            ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, max_y),
        ]
    }
}

/// Decode an Ultralytics export output of shape `[1, 4 + num_classes, anchors]`
///
/// Each anchor column holds `cx, cy, w, h` followed by one score per class.
/// Candidates below the confidence threshold are dropped, the rest go through
/// class-aware NMS and are mapped back through the letterbox.
pub fn decode_yolo_output(
    output: ArrayViewD<f32>,
    letterbox: &Letterbox,
    params: &DetectionParams,
) -> Result<Vec<RawDetection>> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
        anyhow::bail!(
            "Unexpected detector output shape: {:?}, expected [1, 4 + classes, anchors]",
            shape
        );
    }

    let num_classes = shape[1] - 4;
    let num_anchors = shape[2];
    let output = output.into_dimensionality::<Ix3>()?;

    let mut candidates = Vec::new();
    for anchor in 0..num_anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::MIN;
        for class in 0..num_classes {
            let score = output[[0, 4 + class, anchor]];
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }

        if !best_score.is_finite() || best_score < params.confidence_threshold {
            continue;
        }

        let cx = output[[0, 0, anchor]];
        let cy = output[[0, 1, anchor]];
        let w = output[[0, 2, anchor]];
        let h = output[[0, 3, anchor]];

        candidates.push(RawDetection {
            class_index: best_class,
            score: best_score,
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        });
    }

    let mut kept = non_max_suppression(candidates, params.iou_threshold);
    kept.truncate(params.max_detections);

    for detection in &mut kept {
        detection.bbox = letterbox.unmap(detection.bbox);
    }

    Ok(kept)
}

/// Class-aware non-maximum suppression, highest score first
pub fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut result: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = result.iter().any(|kept| {
            kept.class_index == candidate.class_index
                && iou(&kept.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            result.push(candidate);
        }
    }

    result
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
