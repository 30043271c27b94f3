//! Editor configuration.
//!
//! Every field has a default, so a host may pass a partial JSON object (or
//! nothing) and override only what it needs.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{EXTEND_MARGIN_PX, HIGHLIGHT_ALPHA, HISTORY_CAP, HISTORY_DEBOUNCE_MS};
use crate::tool::ToolDefaults;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid editor config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_cap: usize,
    pub history_debounce_ms: f64,
    /// How far strokes may run past the canvas edge (backing px).
    pub extend_margin_px: f64,
    /// Alpha a highlighter stroke is composited with.
    pub highlight_alpha: f64,
    pub tools: ToolDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_cap: HISTORY_CAP,
            history_debounce_ms: HISTORY_DEBOUNCE_MS,
            extend_margin_px: EXTEND_MARGIN_PX,
            highlight_alpha: HIGHLIGHT_ALPHA,
            tools: ToolDefaults::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON override and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Names the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_cap == 0 {
            return Err(invalid("history_cap", "must be at least 1"));
        }
        non_negative("history_debounce_ms", self.history_debounce_ms)?;
        non_negative("extend_margin_px", self.extend_margin_px)?;
        if !(self.highlight_alpha > 0.0 && self.highlight_alpha <= 1.0) {
            return Err(invalid("highlight_alpha", "must be in (0, 1]"));
        }
        for (field, size) in [
            ("tools.pen.size", self.tools.pen.size),
            ("tools.highlighter.size", self.tools.highlighter.size),
            ("tools.eraser.size", self.tools.eraser.size),
            ("tools.shape.size", self.tools.shape.size),
        ] {
            if !(size.is_finite() && size > 0.0) {
                return Err(invalid(field, "must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_owned() }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a non-negative number"))
    }
}
