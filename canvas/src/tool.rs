//! Tool modes, per-tool remembered settings and the pointer gesture state.
//!
//! Exactly one tool is active. Each tool keeps its own size, colour and
//! (for shapes) kind and dash flag, so switching away and back restores what
//! the user last picked. The editor and the floor-plan viewer allow different
//! tool sets; only the viewer has `Pan`, and only there does clicking the
//! active tool again toggle back to it.

#[cfg(test)]
#[path = "tool_test.rs"]
mod tool_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{BLUE, RED, TEXT_BACKGROUND, YELLOW};
use crate::shape::{Color, ShapeKind, ShapeStyle};
use crate::text::{TextDrag, TextId};

/// Which tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Floor-plan viewer only.
    Pan,
    Pen,
    Highlighter,
    Eraser,
    Shape,
    Text,
    /// Floor-plan viewer only: drop a pin.
    Pin,
}

impl Tool {
    /// Tools whose drags request pointer capture so they may leave the canvas.
    /// Text only captures while a box is dragged.
    #[must_use]
    pub fn captures_pointer(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter | Self::Eraser | Self::Shape | Self::Text)
    }

    /// Whether the size control applies.
    #[must_use]
    pub fn has_size(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter | Self::Eraser | Self::Shape)
    }

    /// Whether the colour swatches apply.
    #[must_use]
    pub fn has_color(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter | Self::Shape | Self::Text)
    }
}

/// Where a tool controller lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolContext {
    Editor,
    FloorPlan,
}

impl ToolContext {
    #[must_use]
    pub fn allows(self, tool: Tool) -> bool {
        match self {
            Self::Editor => matches!(
                tool,
                Tool::Pen | Tool::Highlighter | Tool::Eraser | Tool::Shape | Tool::Text
            ),
            Self::FloorPlan => matches!(tool, Tool::Pan | Tool::Pin | Tool::Eraser),
        }
    }

    #[must_use]
    pub fn initial_tool(self) -> Tool {
        match self {
            Self::Editor => Tool::Pen,
            Self::FloorPlan => Tool::Pan,
        }
    }
}

/// Colours offered by the swatch row.
pub const PALETTE: [&str; 3] = [RED, YELLOW, BLUE];

/// Allowed sizes for a tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SizeRange {
    /// Clamp into range and snap to the step grid anchored at `min`.
    #[must_use]
    pub fn clamp(self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.min;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }

    #[must_use]
    pub fn for_tool(tool: Tool) -> Option<Self> {
        let range = |min, max, step| Some(Self { min, max, step });
        match tool {
            Tool::Pen => range(1.0, 56.0, 1.0),
            Tool::Highlighter => range(4.0, 56.0, 1.0),
            Tool::Eraser => range(4.0, 220.0, 1.0),
            Tool::Shape => range(2.0, 9.0, 0.5),
            Tool::Pan | Tool::Text | Tool::Pin => None,
        }
    }
}

/// Remembered settings for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub size: f64,
    pub color: Color,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default = "default_shape_kind")]
    pub shape_kind: ShapeKind,
}

fn default_shape_kind() -> ShapeKind {
    ShapeKind::Ellipse
}

impl ToolSettings {
    fn new(size: f64, color: &'static str) -> Self {
        Self {
            size,
            color: Color::from_static(color),
            dashed: false,
            shape_kind: ShapeKind::Ellipse,
        }
    }
}

/// Settings each tool starts with when an editor opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefaults {
    pub pen: ToolSettings,
    pub highlighter: ToolSettings,
    pub eraser: ToolSettings,
    pub shape: ToolSettings,
    pub text: ToolSettings,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            pen: ToolSettings::new(4.0, RED),
            highlighter: ToolSettings::new(18.0, YELLOW),
            eraser: ToolSettings::new(80.0, RED),
            shape: ToolSettings::new(4.0, RED),
            text: ToolSettings::new(0.0, TEXT_BACKGROUND),
        }
    }
}

/// Result of [`ToolController::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChange {
    Switched { from: Tool, to: Tool },
    /// Re-clicking the active tool returned to pan.
    ToggledToPan { from: Tool },
    Unchanged,
    /// The tool is not offered in this context.
    Rejected,
}

impl ToolChange {
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Switched { .. } | Self::ToggledToPan { .. })
    }
}

/// Active tool plus per-tool memory.
#[derive(Debug, Clone)]
pub struct ToolController {
    context: ToolContext,
    active: Tool,
    defaults: ToolDefaults,
    memory: ToolDefaults,
}

impl ToolController {
    #[must_use]
    pub fn new(context: ToolContext, defaults: ToolDefaults) -> Self {
        Self {
            context,
            active: context.initial_tool(),
            memory: defaults.clone(),
            defaults,
        }
    }

    /// Back to the initial tool with default settings, as when a new target opens.
    pub fn reset(&mut self) {
        self.active = self.context.initial_tool();
        self.memory = self.defaults.clone();
    }

    #[must_use]
    pub fn context(&self) -> ToolContext {
        self.context
    }

    #[must_use]
    pub fn active(&self) -> Tool {
        self.active
    }

    /// Activate `tool`.
    pub fn select(&mut self, tool: Tool) -> ToolChange {
        if !self.context.allows(tool) {
            debug!(?tool, context = ?self.context, "tool: not available here");
            return ToolChange::Rejected;
        }
        if tool == self.active {
            if self.context.allows(Tool::Pan) && tool != Tool::Pan {
                self.active = Tool::Pan;
                return ToolChange::ToggledToPan { from: tool };
            }
            return ToolChange::Unchanged;
        }
        let from = self.active;
        self.active = tool;
        ToolChange::Switched { from, to: tool }
    }

    /// Settings remembered for `tool`, if it has any.
    #[must_use]
    pub fn settings_for(&self, tool: Tool) -> Option<&ToolSettings> {
        match tool {
            Tool::Pen => Some(&self.memory.pen),
            Tool::Highlighter => Some(&self.memory.highlighter),
            Tool::Eraser => Some(&self.memory.eraser),
            Tool::Shape => Some(&self.memory.shape),
            Tool::Text => Some(&self.memory.text),
            Tool::Pan | Tool::Pin => None,
        }
    }

    fn settings_mut(&mut self, tool: Tool) -> Option<&mut ToolSettings> {
        match tool {
            Tool::Pen => Some(&mut self.memory.pen),
            Tool::Highlighter => Some(&mut self.memory.highlighter),
            Tool::Eraser => Some(&mut self.memory.eraser),
            Tool::Shape => Some(&mut self.memory.shape),
            Tool::Text => Some(&mut self.memory.text),
            Tool::Pan | Tool::Pin => None,
        }
    }

    /// Settings of the active tool.
    #[must_use]
    pub fn current(&self) -> Option<&ToolSettings> {
        self.settings_for(self.active)
    }

    /// Set the active tool's size, clamped to its range. Returns the stored size.
    pub fn set_size(&mut self, size: f64) -> Option<f64> {
        if !self.active.has_size() {
            return None;
        }
        let range = SizeRange::for_tool(self.active)?;
        let settings = self.settings_mut(self.active)?;
        settings.size = range.clamp(size);
        Some(settings.size)
    }

    /// Set the active tool's colour. Ignored for tools without swatches.
    pub fn set_color(&mut self, color: Color) -> bool {
        if !self.active.has_color() {
            return false;
        }
        match self.settings_mut(self.active) {
            Some(settings) => {
                settings.color = color;
                true
            }
            None => false,
        }
    }

    /// Set the active tool's colour from the swatch row.
    pub fn pick_swatch(&mut self, index: usize) -> bool {
        match PALETTE.get(index) {
            Some(hex) => self.set_color(Color::from_static(hex)),
            None => false,
        }
    }

    pub fn set_shape_kind(&mut self, kind: ShapeKind) {
        if kind != ShapeKind::Freehand {
            self.memory.shape.shape_kind = kind;
        }
    }

    /// Flip the shape dash flag; returns the new value.
    pub fn toggle_dashed(&mut self) -> bool {
        self.memory.shape.dashed = !self.memory.shape.dashed;
        self.memory.shape.dashed
    }

    #[must_use]
    pub fn shape_kind(&self) -> ShapeKind {
        self.memory.shape.shape_kind
    }

    /// Style a new shape is committed with.
    #[must_use]
    pub fn shape_style(&self) -> ShapeStyle {
        let s = &self.memory.shape;
        ShapeStyle { color: s.color.clone(), thickness: s.size, dashed: s.dashed }
    }

    #[must_use]
    pub fn pen_settings(&self) -> &ToolSettings {
        &self.memory.pen
    }

    #[must_use]
    pub fn highlighter_settings(&self) -> &ToolSettings {
        &self.memory.highlighter
    }

    #[must_use]
    pub fn eraser_size(&self) -> f64 {
        self.memory.eraser.size
    }

    #[must_use]
    pub fn text_background(&self) -> &Color {
        &self.memory.text.color
    }
}

/// The pointer gesture in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Pen, highlighter, eraser or shape drag on the ink stack.
    Drawing { tool: Tool, pointer_id: Option<i32> },
    /// Press on a text box; becomes a move once past the drag threshold.
    Text { id: TextId, drag: TextDrag, pointer_id: Option<i32> },
}

impl Gesture {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Pointer that should be released when the gesture ends.
    #[must_use]
    pub fn captured_pointer(&self) -> Option<i32> {
        match self {
            Self::Drawing { pointer_id, .. } | Self::Text { pointer_id, .. } => *pointer_id,
            Self::Idle => None,
        }
    }
}
