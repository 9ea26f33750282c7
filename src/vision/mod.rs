// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision capabilities for waste detection
//!
//! This module provides:
//! - Object detection via YOLO on ONNX Runtime
//! - Foreground extraction via U2-Net or an external tool
//!
//! Both run on CPU and are exposed to the pipeline through traits.

pub mod detection;
pub mod image_utils;
pub mod model_manager;
pub mod segmentation;

pub use detection::{DetectionParams, Detector, RawDetection};
pub use image_utils::{decode_image_bytes, encode_jpeg, ImageError, ImageInfo};
pub use model_manager::{ExtractorBackend, VisionModelConfig, VisionModelInfo, VisionModels};
pub use segmentation::ForegroundExtractor;
