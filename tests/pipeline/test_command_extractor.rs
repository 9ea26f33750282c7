// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! File-based foreground extractor: staging files must not outlive a call

#![cfg(unix)]

use greenlens::vision::segmentation::CommandExtractor;
use greenlens::vision::ForegroundExtractor;
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::PathBuf;

/// Copies input to output and records the staging directory it ran in
fn recording_extractor(dir: &tempfile::TempDir, exit_code: i32) -> (CommandExtractor, PathBuf) {
    let log = dir.path().join("seen.txt");
    let script = dir.path().join("extract.sh");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\ncp \"$1\" \"$2\"\ndirname \"$1\" > \"{}\"\nexit {}\n",
            log.display(),
            exit_code
        ),
    )
    .unwrap();

    let template = format!("sh {} {{input}} {{output}}", script.display());
    (CommandExtractor::from_template(&template).unwrap(), log)
}

fn staging_dir(log: &PathBuf) -> PathBuf {
    PathBuf::from(fs::read_to_string(log).unwrap().trim())
}

#[test]
fn test_staging_dir_removed_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let (extractor, log) = recording_extractor(&dir, 0);

    let image = RgbaImage::from_pixel(6, 4, Rgba([1, 2, 3, 255]));
    let result = extractor.extract(&image).unwrap();

    assert_eq!(result.dimensions(), (6, 4));
    assert!(!staging_dir(&log).exists());
}

#[test]
fn test_staging_dir_removed_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (extractor, log) = recording_extractor(&dir, 3);

    let image = RgbaImage::from_pixel(6, 4, Rgba([1, 2, 3, 255]));
    assert!(extractor.extract(&image).is_err());

    assert!(!staging_dir(&log).exists());
}

#[test]
fn test_each_call_gets_its_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    let (extractor, log) = recording_extractor(&dir, 0);
    let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));

    extractor.extract(&image).unwrap();
    let first = staging_dir(&log);
    extractor.extract(&image).unwrap();
    let second = staging_dir(&log);

    assert_ne!(first, second);
}
