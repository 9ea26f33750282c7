// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the greenlens detection service

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Service name reported in logs
pub const SERVICE_NAME: &str = "greenlens";

/// Supported features in this version, reported by `GET /health`
pub const FEATURES: &[&str] = &[
    "foreground-isolation",
    "yolo-onnx-detection",
    "category-tally",
    "annotated-jpeg",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} {}", SERVICE_NAME, VERSION_NUMBER)
}
