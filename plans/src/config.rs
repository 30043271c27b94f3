//! Floor-plan viewer configuration.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid viewer config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale multiplier per wheel notch towards the user.
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    /// Pointer travel (CSS px) that turns a pin-tool press into a pan.
    pub pin_drag_threshold_px: f64,
    /// Whether fitting may enlarge a plan smaller than the viewport.
    pub fit_upscale: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
            pin_drag_threshold_px: 5.0,
            fit_upscale: false,
        }
    }
}

impl ViewerConfig {
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

    /// # Errors
    ///
    /// Names the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_scale > 0.0 && self.min_scale.is_finite()) {
            return Err(invalid("min_scale", "must be positive"));
        }
        if !(self.max_scale >= self.min_scale && self.max_scale.is_finite()) {
            return Err(invalid("max_scale", "must be at least min_scale"));
        }
        if !(self.zoom_in_factor > 1.0 && self.zoom_in_factor.is_finite()) {
            return Err(invalid("zoom_in_factor", "must be greater than 1"));
        }
        if !(self.zoom_out_factor > 0.0 && self.zoom_out_factor < 1.0) {
            return Err(invalid("zoom_out_factor", "must be in (0, 1)"));
        }
        if !(self.pin_drag_threshold_px >= 0.0 && self.pin_drag_threshold_px.is_finite()) {
            return Err(invalid("pin_drag_threshold_px", "must be non-negative"));
        }
        Ok(())
    }

    /// Clamp a scale into the zoom limits.
    #[must_use]
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_owned() }
}
