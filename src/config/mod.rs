// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from command-line flags and environment

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::annotator::DEFAULT_JPEG_QUALITY;
use crate::pipeline::validator::DEFAULT_MAX_UPLOAD_BYTES;
use crate::pipeline::UploadPolicy;
use crate::vision::detection::yolo::DEFAULT_INPUT_SIZE;
use crate::vision::detection::{
    YoloOnnxDetectorConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD,
    DEFAULT_MAX_DETECTIONS,
};
use crate::vision::segmentation::U2NetExtractorConfig;
use crate::vision::{DetectionParams, ExtractorBackend, VisionModelConfig};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f32 },

    #[error("JPEG quality must be within 1..=100, got {0}")]
    InvalidJpegQuality(u8),

    #[error("detector input size must be > 0")]
    ZeroInputSize,

    #[error("max detections must be > 0")]
    ZeroMaxDetections,

    #[error("max upload size must be > 0")]
    ZeroUploadLimit,

    #[error("--extractor-command is required for the command extractor backend")]
    MissingExtractorCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractorKind {
    /// U2-Net model on ONNX Runtime
    Onnx,
    /// External command operating on files
    Command,
}

/// greenlens recyclable-waste detection service
#[derive(Parser, Debug, Clone)]
#[command(name = "greenlens")]
#[command(version)]
#[command(about = "Counts recyclable items in uploaded photos", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Path to the YOLO ONNX export
    #[arg(long, env = "DETECTOR_MODEL_PATH", default_value = "./models/detector.onnx")]
    pub detector_model: PathBuf,

    /// Detector name reported by GET / (defaults to the model file stem)
    #[arg(long, env = "DETECTOR_NAME")]
    pub detector_name: Option<String>,

    /// Square detector input size
    #[arg(long, env = "DETECTOR_INPUT_SIZE", default_value_t = DEFAULT_INPUT_SIZE)]
    pub detector_input_size: u32,

    /// Confidence threshold passed to the detector
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f32,

    /// IoU threshold for duplicate-box suppression
    #[arg(long, env = "IOU_THRESHOLD", default_value_t = DEFAULT_IOU_THRESHOLD)]
    pub iou: f32,

    /// Maximum detections per image
    #[arg(long, env = "MAX_DETECTIONS", default_value_t = DEFAULT_MAX_DETECTIONS)]
    pub max_detections: usize,

    /// Foreground extractor backend
    #[arg(long, env = "EXTRACTOR_BACKEND", value_enum, default_value_t = ExtractorKind::Onnx)]
    pub extractor: ExtractorKind,

    /// Path to the U2-Net ONNX model
    #[arg(long, env = "EXTRACTOR_MODEL_PATH", default_value = "./models/u2net.onnx")]
    pub extractor_model: PathBuf,

    /// Command template with {input} and {output} placeholders
    #[arg(long, env = "EXTRACTOR_COMMAND")]
    pub extractor_command: Option<String>,

    /// TOML category catalog (built-in six categories when absent)
    #[arg(long, env = "CATALOG_PATH")]
    pub catalog: Option<PathBuf>,

    /// JPEG quality of the annotated image
    #[arg(long, env = "JPEG_QUALITY", default_value_t = DEFAULT_JPEG_QUALITY)]
    pub jpeg_quality: u8,

    /// TTF/OTF font for box labels (boxes only when absent)
    #[arg(long, env = "LABEL_FONT_PATH")]
    pub label_font: Option<PathBuf>,

    /// Maximum upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// ONNX Runtime intra-op threads per model
    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("confidence", self.confidence), ("iou", self.iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }
        if self.detector_input_size == 0 {
            return Err(ConfigError::ZeroInputSize);
        }
        if self.max_detections == 0 {
            return Err(ConfigError::ZeroMaxDetections);
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }
        if self.extractor == ExtractorKind::Command && self.extractor_command.is_none() {
            return Err(ConfigError::MissingExtractorCommand);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn detection_params(&self) -> DetectionParams {
        DetectionParams {
            confidence_threshold: self.confidence,
            iou_threshold: self.iou,
            max_detections: self.max_detections,
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.max_upload_bytes)
    }

    pub fn vision_model_config(&self) -> VisionModelConfig {
        let extractor = match (self.extractor, &self.extractor_command) {
            (ExtractorKind::Command, Some(template)) => ExtractorBackend::Command(template.clone()),
            _ => ExtractorBackend::Onnx(U2NetExtractorConfig {
                model_path: self.extractor_model.clone(),
                intra_threads: self.intra_threads,
            }),
        };

        VisionModelConfig {
            detector: YoloOnnxDetectorConfig {
                model_path: self.detector_model.clone(),
                name: self.detector_name.clone(),
                input_size: self.detector_input_size,
                intra_threads: self.intra_threads,
            },
            extractor,
        }
    }
}
