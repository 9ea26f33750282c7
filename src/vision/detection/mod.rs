// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection capability
//!
//! Components:
//! - `Detector` - the capability seam the pipeline calls into
//! - `yolo` - ONNX Runtime implementation for Ultralytics YOLO exports
//! - `postprocess` - output decoding and non-maximum suppression

pub mod postprocess;
pub mod yolo;

pub use yolo::{YoloOnnxDetector, YoloOnnxDetectorConfig};

use image::RgbImage;

/// Default confidence operating point
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Default IoU threshold for duplicate-box elimination
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

/// Default cap on detections per image
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// Thresholds handed to the detector on every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Detections scoring below this are dropped by the detector
    pub confidence_threshold: f32,
    /// Overlap above which a lower-scoring box of the same class is suppressed
    pub iou_threshold: f32,
    /// Maximum number of detections returned
    pub max_detections: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

/// Detector-native output for one instance
///
/// `bbox` is `[x_min, y_min, x_max, y_max]` in input image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_index: usize,
    pub score: f32,
    pub bbox: [f32; 4],
}

/// Object detector capability
///
/// Implementations own any internal non-maximum suppression and must apply
/// `params.confidence_threshold` themselves. Calls are blocking and may take
/// seconds.
pub trait Detector: Send + Sync {
    /// Identifier reported by the service metadata endpoint
    fn name(&self) -> &str;

    fn detect(
        &self,
        image: &RgbImage,
        params: &DetectionParams,
    ) -> anyhow::Result<Vec<RawDetection>>;
}
