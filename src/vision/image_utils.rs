// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and encoding helpers shared by the pipeline stages

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// Prefix of the data URI carrying the annotated image
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Custom error types for image processing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Not a JPEG data URI")]
    InvalidDataUri,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw image bytes (for multipart uploads)
///
/// The format is sniffed from the content. Formats without a signature
/// (TGA) fall back to the declared MIME type, if any.
///
/// # Returns
/// * `Ok((DynamicImage, ImageInfo))` - The decoded image and metadata
/// * `Err(ImageError)` - If the bytes are empty, unrecognised or corrupt
pub fn decode_image_bytes(
    bytes: &[u8],
    content_type: Option<&str>,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let format = reader
        .format()
        .or_else(|| content_type.and_then(format_from_mime))
        .ok_or(ImageError::UnsupportedFormat)?;
    reader.set_format(format);

    let img = reader
        .decode()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Map a `Content-Type` value such as `image/x-tga; name=a.tga` to a format
fn format_from_mime(content_type: &str) -> Option<ImageFormat> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    ImageFormat::from_mime_type(essence)
}

/// Encode an RGB bitmap as JPEG at the given quality (1-100)
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode_image(image)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(buffer)
}

/// Wrap JPEG bytes into a `data:image/jpeg;base64,` URI
pub fn to_jpeg_data_uri(jpeg_bytes: &[u8]) -> String {
    format!("{}{}", JPEG_DATA_URI_PREFIX, STANDARD.encode(jpeg_bytes))
}

/// Inverse of [`to_jpeg_data_uri`]
pub fn decode_jpeg_data_uri(uri: &str) -> Result<Vec<u8>, ImageError> {
    let payload = uri
        .strip_prefix(JPEG_DATA_URI_PREFIX)
        .ok_or(ImageError::InvalidDataUri)?;
    Ok(STANDARD.decode(payload)?)
}
