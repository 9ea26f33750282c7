// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod version;
pub mod vision;

pub use api::{build_router, AppState};
pub use catalog::{CategoryCatalog, CategoryEntry};
pub use pipeline::{PredictError, Prediction, PredictionPipeline, UploadedImage};
pub use vision::{Detector, ForegroundExtractor, VisionModels};
