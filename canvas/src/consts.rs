//! Shared numeric constants for the canvas crate.
//!
//! Most of these are defaults for [`crate::config::EditorConfig`]; the paint
//! constants are fixed by the look of the annotations and are not configurable.

use std::f64::consts::PI;

// ── Coordinates ─────────────────────────────────────────────────

/// How far (backing px) a stroke may run past each canvas edge.
pub const EXTEND_MARGIN_PX: f64 = 10.0;

// ── Gesture thresholds ──────────────────────────────────────────

/// Shapes whose |dx| and |dy| are both below this are treated as taps.
pub const MIN_SHAPE_DELTA_PX: f64 = 3.0;

/// Arrows shorter than this are treated as taps.
pub const MIN_ARROW_LENGTH_PX: f64 = 5.0;

/// Pointer travel (CSS px) that turns a text-box press into a drag.
pub const TEXT_DRAG_THRESHOLD_PX: f64 = 5.0;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of history entries kept per editing session.
pub const HISTORY_CAP: usize = 20;

/// Captures closer together than this (ms) are merged.
pub const HISTORY_DEBOUNCE_MS: f64 = 100.0;

// ── Paint ───────────────────────────────────────────────────────

/// Alpha used when compositing a highlighter stroke onto the ink layer.
pub const HIGHLIGHT_ALPHA: f64 = 0.18;

/// Alpha of the live shape preview.
pub const SHAPE_PREVIEW_ALPHA: f64 = 0.8;

/// Arrowhead length as a multiple of the stroke thickness.
pub const ARROW_HEAD_LENGTH_FACTOR: f64 = 6.0;

/// Arrowhead half-angle (30°).
pub const ARROW_HEAD_HALF_ANGLE: f64 = PI / 6.0;

/// Dash pattern (dash, gap) in CSS px; multiplied by the device pixel ratio.
pub const DASH_PATTERN: [f64; 2] = [3.0, 6.0];

/// Width of the white contrast outline drawn over dashed shapes.
pub const DASHED_OUTLINE_PX: f64 = 0.5;

/// Minimum eraser hit tolerance regardless of brush size.
pub const MIN_ERASE_TOLERANCE_PX: f64 = 2.0;

/// Eraser cursor: inset of the white inner ring from the black outer ring.
pub const ERASER_RING_INSET_PX: f64 = 2.0;

/// Eraser cursor fill.
pub const ERASER_FILL: &str = "rgba(255,255,255,0.2)";

// ── Palette ─────────────────────────────────────────────────────

pub const RED: &str = "#ff3b30";
pub const YELLOW: &str = "#fff200";
pub const BLUE: &str = "#3fb7ff";

/// Default text-box background.
pub const TEXT_BACKGROUND: &str = "#e53935";

/// Text-box background alpha.
pub const TEXT_BACKGROUND_ALPHA: f64 = 0.85;

// ── Text boxes ──────────────────────────────────────────────────

/// Text box width bounds in CSS px.
pub const TEXT_MIN_WIDTH_CSS: f64 = 160.0;
pub const TEXT_MAX_WIDTH_CSS: f64 = 360.0;

/// Gap kept between a new text box and the layer's right edge.
pub const TEXT_EDGE_GAP_CSS: f64 = 10.0;

/// Default font size in CSS px.
pub const TEXT_FONT_SIZE_CSS: f64 = 24.0;
