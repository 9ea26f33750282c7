// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use crate::pipeline::PredictError;

/// Detail returned for every server-side failure
pub const GENERIC_FAILURE_DETAIL: &str = "Lỗi không xác định trong quá trình dự đoán.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Caller-visible failures: a specific client reason or an opaque server error
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    InternalError,
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let detail = match self {
            ApiError::InvalidRequest(reason) => reason.clone(),
            ApiError::InternalError => GENERIC_FAILURE_DETAIL.to_string(),
        };
        ErrorResponse { detail }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::InternalError => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(reason) => write!(f, "Invalid request: {}", reason),
            ApiError::InternalError => write!(f, "Internal error"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InvalidInput(reason) => {
                warn!("Rejected upload: {}", reason);
                ApiError::InvalidRequest(reason.to_string())
            }
            other => {
                // Full chain stays in the log, never in the body
                error!("Prediction failed: {}", other);
                ApiError::InternalError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
