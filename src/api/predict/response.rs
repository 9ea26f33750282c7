// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction response types

use serde::{Deserialize, Serialize};

use crate::catalog::{CategoryCatalog, UNKNOWN_CATEGORY_KEY};
use crate::pipeline::Prediction;
use crate::vision::image_utils::to_jpeg_data_uri;

/// One observed category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    /// Category key
    pub name: String,
    /// Display label
    pub label: String,
    pub quantity: usize,
}

/// Response from a successful prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub items: Vec<ItemRecord>,
    /// `data:image/jpeg;base64,...`
    pub image: String,
}

/// Build the success payload
///
/// Items follow catalog order with unknown last; unobserved categories are
/// omitted rather than listed with zero.
pub fn assemble(prediction: &Prediction, catalog: &CategoryCatalog) -> PredictResponse {
    let summary = &prediction.summary;

    let mut items: Vec<ItemRecord> = catalog
        .entries()
        .iter()
        .filter_map(|entry| {
            let quantity = summary.count(&entry.key);
            (quantity > 0).then(|| ItemRecord {
                name: entry.key.clone(),
                label: entry.label.clone(),
                quantity,
            })
        })
        .collect();

    let unknown = summary.count(UNKNOWN_CATEGORY_KEY);
    if unknown > 0 {
        items.push(ItemRecord {
            name: UNKNOWN_CATEGORY_KEY.to_string(),
            label: catalog.label_for(UNKNOWN_CATEGORY_KEY).to_string(),
            quantity: unknown,
        });
    }

    PredictResponse {
        items,
        image: to_jpeg_data_uri(&prediction.annotated.jpeg),
    }
}
