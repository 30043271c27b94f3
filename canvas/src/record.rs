//! What an editing session saves and exports.
//!
//! [`AnnotationRecord`] is the persisted JSON for one report item: the
//! host-encoded freehand ink, the vector shapes and the text boxes, all in
//! backing pixels, plus the item's notes. Reopening the item feeds the record
//! back into [`crate::engine::EditorCore::open`].
//!
//! [`ExportBundle`] is what the report generator consumes: the flattened
//! image and the raw pieces it was flattened from.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use serde::{Deserialize, Serialize};

use crate::layer::LayerError;
use crate::shape::Shape;
use crate::text::TextRecord;

/// Current persisted format.
pub const RECORD_VERSION: u32 = 1;

/// Key prefix for annotation records, scoped per report item.
pub const RECORD_KEY_PREFIX: &str = "JL_annotation_";

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("annotation record JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("annotation record version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    Layer(#[from] LayerError),
}

fn current_version() -> u32 {
    RECORD_VERSION
}

/// Saved annotations of one report item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    #[serde(default = "current_version")]
    pub version: u32,
    /// Freehand ink encoded by the host (a PNG data URL in the browser).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ink_url: Option<String>,
    /// The source image the ink was drawn over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Flattened preview shown on the report tile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composed_url: Option<String>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub texts: Vec<TextRecord>,
    #[serde(default)]
    pub notes: String,
}

impl Default for AnnotationRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            ink_url: None,
            base_url: None,
            composed_url: None,
            shapes: Vec::new(),
            texts: Vec::new(),
            notes: String::new(),
        }
    }
}

impl AnnotationRecord {
    /// Storage key for the record of `item_id`.
    #[must_use]
    pub fn key(item_id: &str) -> String {
        store::scoped_key(RECORD_KEY_PREFIX, item_id)
    }

    /// Decode a stored record.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or a record from a newer format.
    pub fn from_json(raw: &str) -> Result<Self, RecordError> {
        let record: Self = serde_json::from_str(raw)?;
        if record.version > RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }

    /// # Errors
    ///
    /// Fails only if a field cannot be serialized.
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether the record carries any annotation content.
    #[must_use]
    pub fn has_annotations(&self) -> bool {
        self.ink_url.is_some() || !self.shapes.is_empty() || !self.texts.is_empty()
    }
}

/// Flattened output plus its parts, handed to the report generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    /// Base image, freehand ink and shapes drawn together.
    pub composited: String,
    /// Freehand ink alone.
    pub ink: String,
    pub shapes: Vec<Shape>,
    pub texts: Vec<TextRecord>,
    pub width: f64,
    pub height: f64,
}
