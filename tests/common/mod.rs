// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process fakes for the detector and foreground extractor, plus request
//! helpers shared by the integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use greenlens::{
    api::{build_router, AppState},
    catalog::CategoryCatalog,
    pipeline::PredictionPipeline,
    vision::{DetectionParams, Detector, ForegroundExtractor, RawDetection, VisionModels},
};
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const BOUNDARY: &str = "greenlens-test-boundary";
pub const SECRET_FAULT: &str = "onnx session exploded at node Conv_42";

/// Returns a fixed list of detections and records what it saw
#[derive(Default)]
pub struct ScriptedDetector {
    pub detections: Vec<RawDetection>,
    pub calls: AtomicUsize,
    pub last_input: Mutex<Option<RgbImage>>,
    pub last_params: Mutex<Option<DetectionParams>>,
}

impl ScriptedDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted-yolo"
    }

    fn detect(&self, image: &RgbImage, params: &DetectionParams) -> anyhow::Result<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(image.clone());
        *self.last_params.lock().unwrap() = Some(*params);
        Ok(self.detections.clone())
    }
}

pub struct FailingDetector;

impl Detector for FailingDetector {
    fn name(&self) -> &str {
        "failing"
    }

    fn detect(&self, _image: &RgbImage, _params: &DetectionParams) -> anyhow::Result<Vec<RawDetection>> {
        anyhow::bail!(SECRET_FAULT)
    }
}

/// Marks the left half as foreground, the right half as background
#[derive(Default)]
pub struct LeftHalfExtractor {
    pub calls: AtomicUsize,
}

impl LeftHalfExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ForegroundExtractor for LeftHalfExtractor {
    fn name(&self) -> &str {
        "left-half"
    }

    fn extract(&self, image: &RgbaImage) -> anyhow::Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut out = image.clone();
        let half = image.width() / 2;
        for (x, _, pixel) in out.enumerate_pixels_mut() {
            pixel[3] = if x < half { 255 } else { 0 };
        }
        Ok(out)
    }
}

pub struct FailingExtractor;

impl ForegroundExtractor for FailingExtractor {
    fn name(&self) -> &str {
        "failing"
    }

    fn extract(&self, _image: &RgbaImage) -> anyhow::Result<RgbaImage> {
        anyhow::bail!(SECRET_FAULT)
    }
}

pub struct PanickingExtractor;

impl ForegroundExtractor for PanickingExtractor {
    fn name(&self) -> &str {
        "panicking"
    }

    fn extract(&self, _image: &RgbaImage) -> anyhow::Result<RgbaImage> {
        panic!("{}", SECRET_FAULT)
    }
}

pub fn raw(class_index: usize, score: f32, bbox: [f32; 4]) -> RawDetection {
    RawDetection {
        class_index,
        score,
        bbox,
    }
}

/// Two plastic bottles and one straw
pub fn bottles_and_straw() -> Vec<RawDetection> {
    vec![
        raw(0, 0.91, [4.0, 4.0, 20.0, 40.0]),
        raw(5, 0.55, [30.0, 10.0, 34.0, 40.0]),
        raw(0, 0.78, [22.0, 4.0, 28.0, 40.0]),
    ]
}

pub fn pipeline(detector: Arc<dyn Detector>, extractor: Arc<dyn ForegroundExtractor>) -> PredictionPipeline {
    PredictionPipeline::new(
        Arc::new(CategoryCatalog::default()),
        VisionModels::from_parts(detector, extractor),
    )
}

pub fn app(detector: Arc<dyn Detector>, extractor: Arc<dyn ForegroundExtractor>) -> Router {
    build_router(AppState::new(pipeline(detector, extractor)))
}

/// Solid-colour PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded_bytes(width, height, ImageFormat::Png)
}

/// Solid-colour image in any format the `image` crate can write
pub fn encoded_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn predict_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn upload_request(content_type: &str, data: &[u8]) -> Request<Body> {
    predict_request("/predict", multipart_body("file", "upload", content_type, data))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
