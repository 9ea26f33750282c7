// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Failure taxonomy of a prediction request

use std::fmt;
use thiserror::Error;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Client mistakes, reported verbatim with a 400
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("Chỉ chấp nhận file ảnh!")]
    NotAnImage,

    #[error("File quá lớn (tối đa {}MB)!", megabytes(.max_bytes))]
    TooLarge { max_bytes: usize },

    #[error("Thiếu trường file trong yêu cầu!")]
    MissingFile,

    #[error("Dữ liệu tải lên không hợp lệ!")]
    MalformedUpload,
}

/// Whole MiB as an integer, anything else rounded up to one decimal
fn megabytes(bytes: &usize) -> String {
    if bytes % BYTES_PER_MB == 0 {
        return (bytes / BYTES_PER_MB).to_string();
    }
    let tenths = bytes.saturating_mul(10).div_ceil(BYTES_PER_MB);
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Pipeline stage a processing failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Isolation,
    Detection,
    Annotation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Isolation => "isolation",
            Stage::Detection => "detection",
            Stage::Annotation => "annotation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// Well-formed upload, downstream processing failed
    #[error("{stage} failed: {cause:#}")]
    Processing { stage: Stage, cause: anyhow::Error },

    /// Anything else, e.g. a panicking stage
    #[error("unclassified fault: {0}")]
    Unclassified(String),
}

impl PredictError {
    pub fn processing(stage: Stage, cause: impl Into<anyhow::Error>) -> Self {
        PredictError::Processing {
            stage,
            cause: cause.into(),
        }
    }

    /// Whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictError::InvalidInput(_))
    }
}

impl From<tokio::task::JoinError> for PredictError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            PredictError::Unclassified("pipeline stage panicked".to_string())
        } else {
            PredictError::Unclassified(format!("pipeline stage did not complete: {}", err))
        }
    }
}
