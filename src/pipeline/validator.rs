// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload admission checks, run before any decoding

use super::errors::InvalidInput;
use super::types::UploadedImage;

/// Upload size ceiling (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const IMAGE_MEDIA_TYPE_PREFIX: &str = "image/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Accept only `image/*` media types
    pub fn check_content_type(&self, content_type: &str) -> Result<(), InvalidInput> {
        let content_type = content_type.trim();
        let is_image = content_type
            .get(..IMAGE_MEDIA_TYPE_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(IMAGE_MEDIA_TYPE_PREFIX));

        if is_image {
            Ok(())
        } else {
            Err(InvalidInput::NotAnImage)
        }
    }

    pub fn check_length(&self, len: usize) -> Result<(), InvalidInput> {
        if len > self.max_bytes {
            return Err(InvalidInput::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Content type first, so a non-image is never reported as too large
    pub fn validate(&self, upload: &UploadedImage) -> Result<(), InvalidInput> {
        self.check_content_type(&upload.content_type)?;
        self.check_length(upload.len())
    }
}
