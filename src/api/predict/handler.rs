// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::request::read_upload;
use super::response::{assemble, PredictResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::pipeline::{InvalidInput, PredictError};

/// POST /predict - Count recyclable items in an uploaded photo
///
/// # Request
/// - multipart field `file`: the image (any `image/*` type, at most 10 MiB)
///
/// # Response
/// - `items`: one record per observed category (`name`, `label`, `quantity`)
/// - `image`: annotated JPEG as a data URI
///
/// # Errors
/// - 400 Bad Request: not an image, too large, missing or malformed upload
/// - 500 Internal Server Error: processing failed (detail withheld)
pub async fn predict_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);

    async move {
        let mut multipart = multipart.map_err(|e| {
            warn!("Multipart rejected: {}", e);
            PredictError::from(InvalidInput::MalformedUpload)
        })?;

        let pipeline = &state.pipeline;
        let upload = read_upload(&mut multipart, pipeline.policy())
            .await
            .map_err(PredictError::from)?;

        let prediction = pipeline.predict(upload).await?;
        Ok::<_, ApiError>(Json(assemble(&prediction, pipeline.catalog())))
    }
    .instrument(span)
    .await
}
