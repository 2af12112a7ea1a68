//! Patch description model.
//!
//! A multi-patch archive carries one `*.json` file next to its patches that lists
//! them in application order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::manifest::is_contained_relative;
use crate::{BundleError, Result};

/// Metadata for one patch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchInfo {
    /// File name relative to the patches root.
    pub filename: String,

    /// Human-readable title of the patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the producer reported this patch as successful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_successful: Option<bool>,

    /// Any other producer metadata, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PatchInfo {
    /// Create an entry for `filename`.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            name: None,
            is_successful: None,
            extra: Map::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the success flag.
    pub fn with_success(mut self, successful: bool) -> Self {
        self.is_successful = Some(successful);
        self
    }

    /// Attach an extra metadata field.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Ordered patch list. Order is application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionContent {
    pub content: Vec<PatchInfo>,
}

impl DescriptionContent {
    pub fn new(content: Vec<PatchInfo>) -> Self {
        Self { content }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Patch file names in application order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.content.iter().map(|p| p.filename.as_str())
    }

    /// Check that the list is usable: non-empty, every filename set and
    /// contained in the patches root.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.content.is_empty() {
            return Err("description lists no patches".to_string());
        }
        for (index, info) in self.content.iter().enumerate() {
            if info.filename.trim().is_empty() {
                return Err(format!("entry {} has an empty filename", index));
            }
            if !is_contained_relative(Path::new(&info.filename)) {
                return Err(format!(
                    "entry {} filename '{}' escapes the patches root",
                    index, info.filename
                ));
            }
        }
        Ok(())
    }

    /// Serialize to JSON with consistent formatting.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate the description read from `path`.
    pub fn from_json(json: &str, path: &Path) -> Result<Self> {
        let corrupt = |reason: String| BundleError::DescriptionCorrupt {
            path: path.to_path_buf(),
            reason,
        };
        let description: DescriptionContent =
            serde_json::from_str(json).map_err(|e| corrupt(e.to_string()))?;
        description.validate().map_err(corrupt)?;
        Ok(description)
    }
}
