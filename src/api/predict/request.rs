// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload extraction

use axum::http::StatusCode;
use axum_extra::extract::multipart::{Multipart, MultipartError};
use tracing::{debug, warn};

use crate::pipeline::{InvalidInput, UploadPolicy, UploadedImage};

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Read the `file` field, enforcing the policy while streaming
///
/// The content type is checked before any of the field body is read, and
/// reading stops at the first chunk that crosses the size limit.
pub async fn read_upload(
    multipart: &mut Multipart,
    policy: &UploadPolicy,
) -> Result<UploadedImage, InvalidInput> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| classify(e, policy))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        policy.check_content_type(&content_type)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| classify(e, policy))? {
            policy.check_length(bytes.len() + chunk.len())?;
            bytes.extend_from_slice(&chunk);
        }

        debug!(
            "Read upload {:?} ({}, {} bytes)",
            filename,
            content_type,
            bytes.len()
        );

        return Ok(UploadedImage {
            bytes,
            content_type,
            filename,
        });
    }

    Err(InvalidInput::MissingFile)
}

fn classify(err: MultipartError, policy: &UploadPolicy) -> InvalidInput {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // The transport limit sits above the policy limit
        InvalidInput::TooLarge {
            max_bytes: policy.max_bytes,
        }
    } else {
        warn!("Malformed multipart body: {}", err);
        InvalidInput::MalformedUpload
    }
}
