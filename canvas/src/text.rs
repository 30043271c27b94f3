//! Text boxes on the DOM overlay.
//!
//! Boxes live in CSS space while the editor is open, because the host lays
//! them out as positioned elements. They are converted to backing pixels only
//! when saved or exported ([`TextRecord`]), and converted back when a saved
//! record is reopened at a possibly different display size.

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{
    TEXT_BACKGROUND, TEXT_DRAG_THRESHOLD_PX, TEXT_EDGE_GAP_CSS, TEXT_FONT_SIZE_CSS, TEXT_MAX_WIDTH_CSS,
    TEXT_MIN_WIDTH_CSS,
};
use crate::coords::{Point, Size, backing_to_css, to_backing_pixels};
use crate::hit::box_contains;
use crate::shape::Color;

pub type TextId = Uuid;

/// Width for a box whose left edge sits at `x` on a layer `layer_width` wide.
#[must_use]
pub fn clamp_width(requested: f64, x: f64, layer_width: f64) -> f64 {
    requested
        .min(TEXT_MAX_WIDTH_CSS)
        .min(layer_width - x - TEXT_EDGE_GAP_CSS)
        .max(TEXT_MIN_WIDTH_CSS)
}

/// An editable text box, in CSS pixels relative to the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub id: TextId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// Rendered height as measured by the host; zero until first layout.
    pub height: f64,
    pub text: String,
    pub background: Color,
    pub font_size: f64,
}

impl TextBox {
    /// New empty box at a click position.
    #[must_use]
    pub fn place(at: Point, layer: Size, background: Color) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: at.x,
            y: at.y,
            width: clamp_width(TEXT_MAX_WIDTH_CSS, at.x, layer.width),
            height: 0.0,
            text: String::new(),
            background,
            font_size: TEXT_FONT_SIZE_CSS,
        }
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Strict containment, edges excluded.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        box_contains(self.origin(), self.width, self.height, point)
    }

    /// Convert to backing pixels for save/export.
    #[must_use]
    pub fn to_record(&self, css: Size, backing: Size) -> TextRecord {
        let origin = to_backing_pixels(self.origin(), css, backing);
        let extent = to_backing_pixels(Point::new(self.width, self.height), css, backing);
        TextRecord {
            x: origin.x,
            y: origin.y,
            w: extent.x,
            h: extent.y,
            text: self.text.clone(),
            bg_color: self.background.clone(),
            font_size: self.font_size * (backing.height / css.height),
        }
    }

    /// Rebuild from a saved record at the current display size.
    #[must_use]
    pub fn from_record(record: &TextRecord, css: Size, backing: Size) -> Self {
        let origin = backing_to_css(Point::new(record.x, record.y), css, backing);
        let extent = backing_to_css(Point::new(record.w, record.h), css, backing);
        Self {
            id: Uuid::new_v4(),
            x: origin.x,
            y: origin.y,
            width: clamp_width(extent.x, origin.x, css.width),
            height: extent.y,
            text: record.text.clone(),
            background: record.bg_color.clone(),
            font_size: TEXT_FONT_SIZE_CSS,
        }
    }
}

fn default_background() -> Color {
    Color::from_static(TEXT_BACKGROUND)
}

/// A text box in backing pixels, as persisted and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRecord {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    #[serde(default)]
    pub h: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_background")]
    pub bg_color: Color,
    #[serde(default)]
    pub font_size: f64,
}

/// How a press on a text box ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRelease {
    /// Under the drag threshold: focus the box for editing.
    Click,
    /// The box was moved.
    Drag,
}

/// Click-versus-drag tracking for a press on a text box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDrag {
    start: Point,
    /// Pointer position minus box origin at press time.
    grab: Point,
    dragged: bool,
}

impl TextDrag {
    #[must_use]
    pub fn begin(pointer: Point, box_origin: Point) -> Self {
        Self {
            start: pointer,
            grab: Point::new(pointer.x - box_origin.x, pointer.y - box_origin.y),
            dragged: false,
        }
    }

    /// New box origin for a pointer move, or `None` while still under the
    /// threshold. Once exceeded the gesture stays a drag.
    pub fn update(&mut self, pointer: Point, box_size: Size, layer: Size) -> Option<Point> {
        if !self.dragged && pointer.distance(self.start) > TEXT_DRAG_THRESHOLD_PX {
            self.dragged = true;
        }
        if !self.dragged {
            return None;
        }
        let max_x = layer.width - box_size.width - 2.0;
        let max_y = layer.height - box_size.height - 2.0;
        Some(Point::new(
            (pointer.x - self.grab.x).min(max_x).max(0.0),
            (pointer.y - self.grab.y).min(max_y).max(0.0),
        ))
    }

    #[must_use]
    pub fn is_drag(&self) -> bool {
        self.dragged
    }

    #[must_use]
    pub fn finish(self) -> TextRelease {
        if self.dragged { TextRelease::Drag } else { TextRelease::Click }
    }
}

/// All text boxes of the open editing target.
#[derive(Debug, Clone, Default)]
pub struct TextLayer {
    boxes: Vec<TextBox>,
}

impl TextLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text_box: TextBox) -> TextId {
        let id = text_box.id;
        self.boxes.push(text_box);
        id
    }

    #[must_use]
    pub fn get(&self, id: &TextId) -> Option<&TextBox> {
        self.boxes.iter().find(|b| b.id == *id)
    }

    pub fn get_mut(&mut self, id: &TextId) -> Option<&mut TextBox> {
        self.boxes.iter_mut().find(|b| b.id == *id)
    }

    /// Topmost box containing `point` (CSS).
    #[must_use]
    pub fn box_at(&self, point: Point) -> Option<&TextBox> {
        self.boxes.iter().rev().find(|b| b.contains(point))
    }

    /// Update content and measured height after the host edits a box.
    pub fn set_text(&mut self, id: &TextId, text: String, measured_height: f64) -> bool {
        match self.get_mut(id) {
            Some(b) => {
                b.text = text;
                b.height = measured_height.max(0.0);
                true
            }
            None => false,
        }
    }

    pub fn set_background(&mut self, id: &TextId, background: Color) -> bool {
        match self.get_mut(id) {
            Some(b) => {
                b.background = background;
                true
            }
            None => false,
        }
    }

    pub fn move_to(&mut self, id: &TextId, origin: Point) -> bool {
        match self.get_mut(id) {
            Some(b) => {
                b.x = origin.x;
                b.y = origin.y;
                true
            }
            None => false,
        }
    }

    /// Remove every box containing `point` (CSS); returns removed ids.
    pub fn erase_at(&mut self, point: Point) -> Vec<TextId> {
        let mut removed = Vec::new();
        self.boxes.retain(|b| {
            if b.contains(point) {
                removed.push(b.id);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn remove(&mut self, id: &TextId) -> bool {
        let before = self.boxes.len();
        self.boxes.retain(|b| b.id != *id);
        self.boxes.len() != before
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<TextBox> {
        self.boxes.clone()
    }

    /// Swap in boxes restored from history.
    pub fn replace(&mut self, boxes: Vec<TextBox>) {
        self.boxes = boxes;
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextBox> {
        self.boxes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    #[must_use]
    pub fn to_records(&self, css: Size, backing: Size) -> Vec<TextRecord> {
        self.boxes.iter().map(|b| b.to_record(css, backing)).collect()
    }

    /// Replace all boxes with ones rebuilt from saved records.
    pub fn load_records(&mut self, records: &[TextRecord], css: Size, backing: Size) {
        self.boxes = records.iter().map(|r| TextBox::from_record(r, css, backing)).collect();
    }
}
