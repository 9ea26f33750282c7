// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::http_server::AppState;
use crate::version;

/// Service metadata returned by `GET /`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfoResponse {
    pub status: String,
    pub model_name: String,
    pub num_classes: usize,
    /// Class id (as a string key) → display label
    pub class_names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub features: Vec<String>,
    pub models: Vec<crate::vision::VisionModelInfo>,
}

/// GET / - service metadata
pub async fn root_handler(State(state): State<AppState>) -> Json<ServiceInfoResponse> {
    let catalog = state.pipeline.catalog();
    let class_names = catalog
        .class_names()
        .into_iter()
        .map(|(id, label)| (id.to_string(), label))
        .collect();

    Json(ServiceInfoResponse {
        status: "API is running".to_string(),
        model_name: state.pipeline.detector_name().to_string(),
        num_classes: catalog.len(),
        class_names,
    })
}

/// GET /health - liveness probe
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version::VERSION_NUMBER.to_string(),
        features: version::FEATURES.iter().map(|f| f.to_string()).collect(),
        models: state.pipeline.models().list_models(),
    })
}
