// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-category tallies

use std::collections::BTreeMap;

use super::types::{Detection, DetectionSummary};
use crate::catalog::CategoryCatalog;

/// Count detections per category key
///
/// Ids missing from the catalog are counted under the reserved unknown key,
/// so the counts always sum to `detections.len()`.
pub fn summarize(detections: Vec<Detection>, catalog: &CategoryCatalog) -> DetectionSummary {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for detection in &detections {
        let key = catalog.resolve(detection.class_id).key();
        *counts.entry(key.to_string()).or_default() += 1;
    }

    DetectionSummary { counts, detections }
}
