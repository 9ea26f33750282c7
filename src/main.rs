// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use greenlens::{
    api::{start_server, AppState},
    catalog::CategoryCatalog,
    config::ServiceConfig,
    pipeline::{Annotator, PredictionPipeline},
    version,
    vision::VisionModels,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("greenlens=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::parse();
    config.validate().context("Invalid configuration")?;

    tracing::info!("🚀 Starting {}", version::get_version_string());

    let catalog = match &config.catalog {
        Some(path) => CategoryCatalog::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => CategoryCatalog::default(),
    };
    tracing::info!("📦 Category catalog: {} categories", catalog.len());

    let models_config = config.vision_model_config();
    let models = tokio::task::spawn_blocking(move || VisionModels::load(&models_config))
        .await
        .context("Model loading task failed")??;

    let mut annotator = Annotator::new(config.jpeg_quality);
    if let Some(path) = &config.label_font {
        annotator = annotator.with_font(Annotator::load_font(path)?);
        tracing::info!("✅ Label font loaded from {}", path.display());
    }

    let pipeline = PredictionPipeline::new(Arc::new(catalog), models)
        .with_policy(config.upload_policy())
        .with_params(config.detection_params())
        .with_annotator(annotator);

    start_server(AppState::new(pipeline), config.socket_addr()).await
}
