// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /predict success-path tests
//!
//! The detector and extractor are in-process fakes, so these run without
//! model files.

use axum::http::StatusCode;
use greenlens::vision::image_utils::decode_jpeg_data_uri;
use std::sync::Arc;

use crate::common::{
    app, bottles_and_straw, encoded_bytes, multipart_body, png_bytes, predict_request, raw, send,
    upload_request, LeftHalfExtractor, ScriptedDetector,
};

#[tokio::test]
async fn test_two_bottles_and_a_straw() {
    let detector = Arc::new(ScriptedDetector::new(bottles_and_straw()));
    let extractor = Arc::new(LeftHalfExtractor::default());
    let router = app(detector.clone(), extractor.clone());

    let (status, body) = send(router, upload_request("image/png", &png_bytes(64, 48))).await;

    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "plastic_bottle");
    assert_eq!(items[0]["label"], "Chai nhựa");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[1]["name"], "straw");
    assert_eq!(items[1]["label"], "Ống hút");
    assert_eq!(items[1]["quantity"], 1);

    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("data:image/jpeg;base64,"));
    assert!(image.len() > "data:image/jpeg;base64,".len());

    assert_eq!(detector.calls(), 1);
    assert_eq!(extractor.calls(), 1);
}

#[tokio::test]
async fn test_zero_detections_still_returns_image() {
    let detector = Arc::new(ScriptedDetector::new(Vec::new()));
    let router = app(detector, Arc::new(LeftHalfExtractor::default()));

    let (status, body) = send(router, upload_request("image/png", &png_bytes(32, 32))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], serde_json::json!([]));
    assert!(body["image"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_annotated_image_round_trip_dimensions() {
    let router = app(
        Arc::new(ScriptedDetector::new(bottles_and_straw())),
        Arc::new(LeftHalfExtractor::default()),
    );

    let (status, body) = send(router, upload_request("image/png", &png_bytes(64, 48))).await;
    assert_eq!(status, StatusCode::OK);

    let jpeg = decode_jpeg_data_uri(body["image"].as_str().unwrap()).unwrap();
    let decoded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg).unwrap();

    assert_eq!((decoded.width(), decoded.height()), (64, 48));
}

#[tokio::test]
async fn test_less_common_raster_formats_are_accepted() {
    let uploads = [
        ("image/x-portable-pixmap", image::ImageFormat::Pnm),
        ("image/x-tga", image::ImageFormat::Tga),
        ("image/x-qoi", image::ImageFormat::Qoi),
    ];

    for (content_type, format) in uploads {
        let detector = Arc::new(ScriptedDetector::new(bottles_and_straw()));
        let router = app(detector.clone(), Arc::new(LeftHalfExtractor::default()));

        let (status, body) =
            send(router, upload_request(content_type, &encoded_bytes(64, 48, format))).await;

        assert_eq!(status, StatusCode::OK, "{} upload failed: {}", content_type, body);
        assert_eq!(body["items"][0]["quantity"], 2);
        assert_eq!(detector.calls(), 1);
    }
}

#[tokio::test]
async fn test_repeated_calls_give_same_counts() {
    let router = app(
        Arc::new(ScriptedDetector::new(bottles_and_straw())),
        Arc::new(LeftHalfExtractor::default()),
    );
    let png = png_bytes(40, 40);

    let (_, first) = send(router.clone(), upload_request("image/png", &png)).await;
    let (_, second) = send(router, upload_request("image/png", &png)).await;

    assert_eq!(first["items"], second["items"]);
}

#[tokio::test]
async fn test_quantities_sum_to_detection_count() {
    let detections = vec![
        raw(0, 0.9, [0.0, 0.0, 5.0, 5.0]),
        raw(1, 0.9, [0.0, 0.0, 5.0, 5.0]),
        raw(2, 0.9, [0.0, 0.0, 5.0, 5.0]),
        raw(2, 0.9, [6.0, 6.0, 9.0, 9.0]),
        raw(4, 0.9, [0.0, 0.0, 5.0, 5.0]),
        raw(17, 0.9, [0.0, 0.0, 5.0, 5.0]),
    ];
    let expected = detections.len() as u64;
    let router = app(
        Arc::new(ScriptedDetector::new(detections)),
        Arc::new(LeftHalfExtractor::default()),
    );

    let (status, body) = send(router, upload_request("image/png", &png_bytes(16, 16))).await;
    assert_eq!(status, StatusCode::OK);

    let items = body["items"].as_array().unwrap();
    let total: u64 = items.iter().map(|i| i["quantity"].as_u64().unwrap()).sum();
    assert_eq!(total, expected);
    // Unmapped class ids are reported last, not dropped
    assert_eq!(items.last().unwrap()["name"], "unknown");
}

#[tokio::test]
async fn test_trailing_slash_route() {
    let router = app(
        Arc::new(ScriptedDetector::new(Vec::new())),
        Arc::new(LeftHalfExtractor::default()),
    );
    let body = multipart_body("file", "photo.png", "image/png", &png_bytes(8, 8));

    let (status, _) = send(router, predict_request("/predict/", body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_detector_sees_white_background() {
    let detector = Arc::new(ScriptedDetector::new(Vec::new()));
    let router = app(detector.clone(), Arc::new(LeftHalfExtractor::default()));

    let (status, _) = send(router, upload_request("image/png", &png_bytes(20, 10))).await;
    assert_eq!(status, StatusCode::OK);

    let seen = detector.last_input.lock().unwrap().clone().unwrap();
    assert_eq!(seen.dimensions(), (20, 10));
    assert_eq!(seen.get_pixel(2, 5).0, [30, 120, 200]);
    assert_eq!(seen.get_pixel(18, 5).0, [255, 255, 255]);
}
