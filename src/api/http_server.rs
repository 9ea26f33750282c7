// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::{any::Any, net::SocketAddr, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    trace::TraceLayer,
};

use super::errors::ApiError;
use super::handlers::{health_handler, root_handler};
use super::predict::predict_handler;
use crate::pipeline::PredictionPipeline;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
}

impl AppState {
    pub fn new(pipeline: PredictionPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Above the upload policy so oversize files get the policy's 400
    let body_limit = state
        .pipeline
        .policy()
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        // Service metadata
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        // Prediction endpoint, with and without trailing slash
        .route("/predict", post(predict_handler))
        .route("/predict/", post(predict_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    ApiError::InternalError.into_response()
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
