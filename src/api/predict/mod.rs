// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction API endpoint module
//!
//! Provides POST /predict for counting recyclable items in a photo.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::predict_handler;
pub use request::{read_upload, FILE_FIELD};
pub use response::{assemble, ItemRecord, PredictResponse};
