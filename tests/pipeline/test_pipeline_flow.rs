// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! PredictionPipeline tests, called directly without HTTP

use greenlens::pipeline::{InvalidInput, PredictError, Stage, UploadPolicy, UploadedImage};
use greenlens::vision::DetectionParams;
use std::sync::Arc;

use crate::common::{
    bottles_and_straw, pipeline, png_bytes, raw, FailingExtractor, LeftHalfExtractor,
    ScriptedDetector,
};

fn png_upload(width: u32, height: u32) -> UploadedImage {
    UploadedImage::new(png_bytes(width, height), "image/png")
}

#[tokio::test]
async fn test_summary_counts_match_detections() {
    let pipeline = pipeline(
        Arc::new(ScriptedDetector::new(bottles_and_straw())),
        Arc::new(LeftHalfExtractor::default()),
    );

    let prediction = pipeline.predict(png_upload(48, 48)).await.unwrap();

    assert_eq!(prediction.summary.count("plastic_bottle"), 2);
    assert_eq!(prediction.summary.count("straw"), 1);
    assert_eq!(prediction.summary.total(), prediction.summary.detections().len());
    assert_eq!((prediction.annotated.width, prediction.annotated.height), (48, 48));
}

#[tokio::test]
async fn test_detection_order_is_preserved() {
    let pipeline = pipeline(
        Arc::new(ScriptedDetector::new(bottles_and_straw())),
        Arc::new(LeftHalfExtractor::default()),
    );

    let prediction = pipeline.predict(png_upload(48, 48)).await.unwrap();
    let classes: Vec<u32> = prediction
        .summary
        .detections()
        .iter()
        .map(|d| d.class_id)
        .collect();
    assert_eq!(classes, vec![0, 5, 0]);
}

#[tokio::test]
async fn test_boxes_are_clamped_to_image() {
    let pipeline = pipeline(
        Arc::new(ScriptedDetector::new(vec![raw(3, 0.6, [-10.0, 5.0, 500.0, 12.0])])),
        Arc::new(LeftHalfExtractor::default()),
    );

    let prediction = pipeline.predict(png_upload(30, 20)).await.unwrap();
    let bbox = prediction.summary.detections()[0].bbox;
    assert_eq!(bbox.x_min, 0.0);
    assert_eq!(bbox.x_max, 30.0);
}

#[tokio::test]
async fn test_thresholds_are_passed_to_detector() {
    let detector = Arc::new(ScriptedDetector::new(Vec::new()));
    let params = DetectionParams {
        confidence_threshold: 0.45,
        iou_threshold: 0.6,
        max_detections: 50,
    };
    let pipeline = pipeline(detector.clone(), Arc::new(LeftHalfExtractor::default()))
        .with_params(params);

    pipeline.predict(png_upload(8, 8)).await.unwrap();

    assert_eq!(*detector.last_params.lock().unwrap(), Some(params));
}

#[tokio::test]
async fn test_policy_rejects_before_any_capability_call() {
    let detector = Arc::new(ScriptedDetector::new(Vec::new()));
    let extractor = Arc::new(LeftHalfExtractor::default());
    let pipeline = pipeline(detector.clone(), extractor.clone()).with_policy(UploadPolicy::new(16));

    let err = pipeline.predict(png_upload(32, 32)).await.unwrap_err();
    assert!(matches!(
        err,
        PredictError::InvalidInput(InvalidInput::TooLarge { max_bytes: 16 })
    ));

    let err = pipeline
        .predict(UploadedImage::new(b"%PDF-1.4".to_vec(), "application/pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, PredictError::InvalidInput(InvalidInput::NotAnImage)));

    assert_eq!(detector.calls(), 0);
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn test_extractor_failure_is_isolation_stage() {
    let detector = Arc::new(ScriptedDetector::new(bottles_and_straw()));
    let pipeline = pipeline(detector.clone(), Arc::new(FailingExtractor));

    let err = pipeline.predict(png_upload(8, 8)).await.unwrap_err();
    assert!(matches!(
        err,
        PredictError::Processing { stage: Stage::Isolation, .. }
    ));
    assert!(!err.is_client_error());
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_undecodable_image_is_decode_stage() {
    let pipeline = pipeline(
        Arc::new(ScriptedDetector::new(Vec::new())),
        Arc::new(LeftHalfExtractor::default()),
    );

    let err = pipeline
        .predict(UploadedImage::new(b"definitely not pixels".to_vec(), "image/jpeg"))
        .await
        .unwrap_err();
    assert!(matches!(err, PredictError::Processing { stage: Stage::Decode, .. }));
}

#[tokio::test]
async fn test_concurrent_requests_share_pipeline() {
    let pipeline = Arc::new(pipeline(
        Arc::new(ScriptedDetector::new(bottles_and_straw())),
        Arc::new(LeftHalfExtractor::default()),
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.predict(png_upload(24, 24)).await })
        })
        .collect();

    for handle in handles {
        let prediction = handle.await.unwrap().unwrap();
        assert_eq!(prediction.summary.total(), 3);
    }
}
