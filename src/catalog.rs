// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Category catalog: category key ↔ detector class id ↔ display label
//!
//! Loaded once at startup and shared read-only by every request.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Reserved key for class ids the catalog does not know
pub const UNKNOWN_CATEGORY_KEY: &str = "unknown";

/// Built-in recyclable-waste categories: (key, class id, Vietnamese label)
const DEFAULT_CATEGORIES: &[(&str, u32, &str)] = &[
    ("plastic_bottle", 0, "Chai nhựa"),
    ("plastic_bottle_cap", 1, "Nắp chai nhựa"),
    ("paper_cup", 2, "Cốc giấy"),
    ("tongue_depressor", 3, "Que đè lưỡi"),
    ("cardboard", 4, "Bìa cứng"),
    ("straw", 5, "Ống hút"),
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Catalog contains no categories")]
    Empty,

    #[error("Duplicate category key: {0}")]
    DuplicateKey(String),

    #[error("Duplicate class id: {0}")]
    DuplicateClassId(u32),

    #[error("Category key must not be empty (class id {0})")]
    EmptyKey(u32),

    #[error("Category key '{0}' is reserved")]
    ReservedKey(String),
}

/// One recognised category
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryEntry {
    /// Stable internal identifier (e.g. "plastic_bottle")
    pub key: String,
    /// Class index emitted by the detector
    pub class_id: u32,
    /// Human-readable, localized label
    pub label: String,
}

/// Resolved view of a class id, either a catalog entry or the unknown bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category<'a> {
    Known(&'a CategoryEntry),
    Unknown,
}

impl<'a> Category<'a> {
    pub fn key(&self) -> &'a str {
        match *self {
            Category::Known(entry) => &entry.key,
            Category::Unknown => UNKNOWN_CATEGORY_KEY,
        }
    }

    /// Display label; the unknown bucket falls back to its key
    pub fn label(&self) -> &'a str {
        match *self {
            Category::Known(entry) => &entry.label,
            Category::Unknown => UNKNOWN_CATEGORY_KEY,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "category", default)]
    categories: Vec<CategoryEntry>,
}

/// Process-wide, read-only category table
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    /// Sorted by class id
    entries: Vec<CategoryEntry>,
    by_class_id: HashMap<u32, usize>,
    by_key: HashMap<String, usize>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        let entries = DEFAULT_CATEGORIES
            .iter()
            .map(|(key, class_id, label)| CategoryEntry {
                key: key.to_string(),
                class_id: *class_id,
                label: label.to_string(),
            })
            .collect();

        Self::index(entries)
    }
}

impl CategoryCatalog {
    /// Build a catalog, rejecting duplicate keys/ids and the reserved key
    pub fn from_entries(mut entries: Vec<CategoryEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen_keys = HashSet::new();
        let mut seen_ids = HashSet::new();
        for entry in &entries {
            if entry.key.trim().is_empty() {
                return Err(CatalogError::EmptyKey(entry.class_id));
            }
            if entry.key == UNKNOWN_CATEGORY_KEY {
                return Err(CatalogError::ReservedKey(entry.key.clone()));
            }
            if !seen_keys.insert(entry.key.clone()) {
                return Err(CatalogError::DuplicateKey(entry.key.clone()));
            }
            if !seen_ids.insert(entry.class_id) {
                return Err(CatalogError::DuplicateClassId(entry.class_id));
            }
        }

        entries.sort_by_key(|e| e.class_id);
        Ok(Self::index(entries))
    }

    /// Entries must already be unique and sorted by class id
    fn index(entries: Vec<CategoryEntry>) -> Self {
        let by_class_id = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.class_id, i))
            .collect();
        let by_key = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();

        Self {
            entries,
            by_class_id,
            by_key,
        }
    }

    /// Parse a TOML catalog:
    ///
    /// ```toml
    /// [[category]]
    /// key = "plastic_bottle"
    /// class_id = 0
    /// label = "Chai nhựa"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_entries(file.categories)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn resolve(&self, class_id: u32) -> Category<'_> {
        match self.by_class_id.get(&class_id) {
            Some(&i) => Category::Known(&self.entries[i]),
            None => Category::Unknown,
        }
    }

    pub fn get_by_key(&self, key: &str) -> Option<&CategoryEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    /// Label for a category key (unknown keys fall back to the key itself)
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.get_by_key(key).map(|e| e.label.as_str()).unwrap_or(key)
    }

    /// Entries in class id order
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// class id → display label, used by the service metadata endpoint
    pub fn class_names(&self) -> BTreeMap<u32, String> {
        self.entries
            .iter()
            .map(|e| (e.class_id, e.label.clone()))
            .collect()
    }
}
