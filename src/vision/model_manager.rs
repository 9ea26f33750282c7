// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loads the detector and foreground extractor at startup

use std::sync::Arc;

use crate::vision::detection::{Detector, YoloOnnxDetector, YoloOnnxDetectorConfig};
use crate::vision::segmentation::{
    CommandExtractor, ForegroundExtractor, U2NetExtractor, U2NetExtractorConfig,
};

/// Which foreground extractor to load
#[derive(Debug, Clone)]
pub enum ExtractorBackend {
    /// U2-Net model on ONNX Runtime
    Onnx(U2NetExtractorConfig),
    /// External command template with `{input}` and `{output}` placeholders
    Command(String),
}

/// Configuration for loading vision models
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    pub detector: YoloOnnxDetectorConfig,
    pub extractor: ExtractorBackend,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            detector: YoloOnnxDetectorConfig::default(),
            extractor: ExtractorBackend::Onnx(U2NetExtractorConfig::default()),
        }
    }
}

/// Information about a loaded vision model
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VisionModelInfo {
    pub name: String,
    /// Model type (detector, extractor)
    pub model_type: String,
}

/// Loaded capabilities shared by every request
#[derive(Clone)]
pub struct VisionModels {
    pub detector: Arc<dyn Detector>,
    pub extractor: Arc<dyn ForegroundExtractor>,
}

impl VisionModels {
    /// Load both capabilities
    ///
    /// Unlike optional models, a missing detector or extractor is fatal: the
    /// service has nothing useful to do without them.
    pub fn load(config: &VisionModelConfig) -> anyhow::Result<Self> {
        let detector = YoloOnnxDetector::new(&config.detector)?;

        let extractor: Arc<dyn ForegroundExtractor> = match &config.extractor {
            ExtractorBackend::Onnx(onnx) => Arc::new(U2NetExtractor::new(onnx)?),
            ExtractorBackend::Command(template) => {
                let extractor = CommandExtractor::from_template(template)?;
                tracing::info!("✅ Foreground extractor command '{}' configured", extractor.program());
                Arc::new(extractor)
            }
        };

        Ok(Self {
            detector: Arc::new(detector),
            extractor,
        })
    }

    /// Assemble from already-constructed capabilities
    pub fn from_parts(
        detector: Arc<dyn Detector>,
        extractor: Arc<dyn ForegroundExtractor>,
    ) -> Self {
        Self { detector, extractor }
    }

    /// List the loaded models
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        vec![
            VisionModelInfo {
                name: self.detector.name().to_string(),
                model_type: "detector".to_string(),
            },
            VisionModelInfo {
                name: self.extractor.name().to_string(),
                model_type: "extractor".to_string(),
            },
        ]
    }
}

impl std::fmt::Debug for VisionModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionModels")
            .field("detector", &self.detector.name())
            .field("extractor", &self.extractor.name())
            .finish()
    }
}
