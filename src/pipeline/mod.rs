// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request-processing pipeline
//!
//! Validator → Isolator → Detector Adapter → Aggregator / Annotator.
//! Stages run strictly in that order; the aggregator and annotator read the
//! same finalized detection list and run concurrently. Blocking work is moved
//! off the async runtime with `spawn_blocking`, and every intermediate buffer
//! is owned by the call so it is released on every exit path.

pub mod aggregator;
pub mod annotator;
pub mod detector_adapter;
pub mod errors;
pub mod isolator;
pub mod types;
pub mod validator;

pub use annotator::Annotator;
pub use errors::{InvalidInput, PredictError, Stage};
pub use types::{
    AnnotatedImage, BoundingBox, Detection, DetectionSummary, IsolatedImage, Prediction,
    UploadedImage,
};
pub use validator::UploadPolicy;

use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::CategoryCatalog;
use crate::vision::{decode_image_bytes, DetectionParams, VisionModels};

/// Read-only handle shared by every request
#[derive(Clone)]
pub struct PredictionPipeline {
    catalog: Arc<CategoryCatalog>,
    models: VisionModels,
    policy: UploadPolicy,
    params: DetectionParams,
    annotator: Arc<Annotator>,
}

impl std::fmt::Debug for PredictionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionPipeline")
            .field("models", &self.models)
            .field("policy", &self.policy)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PredictionPipeline {
    pub fn new(catalog: Arc<CategoryCatalog>, models: VisionModels) -> Self {
        Self {
            catalog,
            models,
            policy: UploadPolicy::default(),
            params: DetectionParams::default(),
            annotator: Arc::new(Annotator::default()),
        }
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = Arc::new(annotator);
        self
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn models(&self) -> &VisionModels {
        &self.models
    }

    pub fn detector_name(&self) -> &str {
        self.models.detector.name()
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Run one upload through every stage
    pub async fn predict(&self, upload: UploadedImage) -> Result<Prediction, PredictError> {
        self.policy.validate(&upload)?;
        debug!(
            "Accepted upload: {} bytes, {}",
            upload.len(),
            upload.content_type
        );

        let extractor = Arc::clone(&self.models.extractor);
        let detector = Arc::clone(&self.models.detector);
        let params = self.params;

        let (isolated, detections) = tokio::task::spawn_blocking(move || {
            let (image, info) = decode_image_bytes(&upload.bytes, Some(&upload.content_type))
                .map_err(|e| PredictError::processing(Stage::Decode, e))?;
            drop(upload);
            debug!(
                "Decoded {}x{} {:?} from {} bytes",
                info.width, info.height, info.format, info.size_bytes
            );

            let isolated = isolator::isolate(extractor.as_ref(), &image)
                .map_err(|e| PredictError::processing(Stage::Isolation, e))?;
            drop(image);

            let detections = detector_adapter::detect(detector.as_ref(), &isolated, &params)
                .map_err(|e| PredictError::processing(Stage::Detection, e))?;

            Ok::<_, PredictError>((isolated, detections))
        })
        .await??;

        let annotator = Arc::clone(&self.annotator);
        let catalog = Arc::clone(&self.catalog);
        let to_draw = detections.clone();
        let annotate = tokio::task::spawn_blocking(move || {
            annotator
                .annotate(&isolated, &to_draw, &catalog)
                .map_err(|e| PredictError::processing(Stage::Annotation, e))
        });

        let summary = aggregator::summarize(detections, &self.catalog);
        let annotated = annotate.await??;

        info!(
            "Prediction complete: {} detections in {} categories",
            summary.total(),
            summary.counts().len()
        );

        Ok(Prediction { summary, annotated })
    }
}
