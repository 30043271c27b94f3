//! Vector marks on the ink layer: shapes, their colours, and the shape list.
//!
//! A [`Shape`] is created when a shape drag ends with enough movement and is
//! immutable afterwards; the eraser may drop it from the [`ShapeList`] but
//! never edits it. Freehand pen and highlighter ink is raster-only; the
//! `Freehand` kind describes the in-progress path of such a stroke and is never
//! stored in the list.
//!
//! All coordinates are backing pixels.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{MIN_ARROW_LENGTH_PX, MIN_SHAPE_DELTA_PX};
use crate::coords::Point;

/// Unique identifier for a committed shape.
pub type ShapeId = Uuid;

/// Canonical lowercase `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

/// Error for a string that is not `#rgb` or `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex colour: {0:?}")]
pub struct InvalidColor(pub String);

impl Color {
    /// Parse `#RGB` or `#RRGGBB` (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidColor`] for anything else.
    pub fn parse(raw: &str) -> Result<Self, InvalidColor> {
        let Some((r, g, b)) = parse_hex_rgb(raw) else {
            return Err(InvalidColor(raw.to_owned()));
        };
        Ok(Self(format!("#{r:02x}{g:02x}{b:02x}")))
    }

    /// Build from a compile-time palette constant, falling back to black for a
    /// malformed constant.
    #[must_use]
    pub fn from_static(raw: &'static str) -> Self {
        Self::parse(raw).unwrap_or_else(|_| Self("#000000".to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green, blue channels.
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        parse_hex_rgb(&self.0).unwrap_or((0, 0, 0))
    }

    /// CSS `rgba(r,g,b,a)` string.
    #[must_use]
    pub fn to_rgba_css(&self, alpha: f64) -> String {
        let (r, g, b) = self.rgb();
        format!("rgba({r},{g},{b},{alpha})")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.0
    }
}

fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| match u8::from_str_radix(s, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    };
    match hex.len() {
        3 => Some((
            channel(&hex[0..1].repeat(2))?,
            channel(&hex[1..2].repeat(2))?,
            channel(&hex[2..3].repeat(2))?,
        )),
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

/// Geometry family of a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Polyline `[x0, y0, x1, y1, ...]`.
    Freehand,
    /// `[cx, cy, rx, ry]`.
    Ellipse,
    /// `[x, y, width, height]` with non-negative size.
    Rectangle,
    /// `[x1, y1, x2, y2]`, head at the second point.
    Arrow,
}

/// Stroke appearance shared by every kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub color: Color,
    pub thickness: f64,
    pub dashed: bool,
}

/// A committed mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub points: Vec<f64>,
    pub color: Color,
    pub thickness: f64,
    #[serde(default)]
    pub dashed: bool,
}

impl Shape {
    /// Build a shape from a drag, or `None` when the drag is a tap.
    ///
    /// Non-arrow shapes need `|dx| >= 3` or `|dy| >= 3`; arrows need a length
    /// of at least 5. `Freehand` has no drag form and always yields `None`.
    #[must_use]
    pub fn from_drag(kind: ShapeKind, start: Point, end: Point, style: &ShapeStyle) -> Option<Self> {
        if is_tap(kind, start, end) {
            return None;
        }
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let points = match kind {
            ShapeKind::Freehand => return None,
            ShapeKind::Ellipse => vec![start.x + dx / 2.0, start.y + dy / 2.0, (dx / 2.0).abs(), (dy / 2.0).abs()],
            ShapeKind::Rectangle => {
                let w = dx.abs();
                let h = dy.abs();
                let x = if dx >= 0.0 { start.x } else { start.x - w };
                let y = if dy >= 0.0 { start.y } else { start.y - h };
                vec![x, y, w, h]
            }
            ShapeKind::Arrow => vec![start.x, start.y, end.x, end.y],
        };
        Some(Self::with_points(kind, points, style))
    }

    /// A freehand path through `points`.
    #[must_use]
    pub fn freehand(points: &[Point], style: &ShapeStyle) -> Self {
        let flat = points.iter().flat_map(|p| [p.x, p.y]).collect();
        Self::with_points(ShapeKind::Freehand, flat, style)
    }

    fn with_points(kind: ShapeKind, points: Vec<f64>, style: &ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            points,
            color: style.color.clone(),
            thickness: style.thickness,
            dashed: style.dashed,
        }
    }

    /// The four geometry numbers for ellipse/rectangle/arrow kinds.
    #[must_use]
    pub fn quad(&self) -> Option<[f64; 4]> {
        match self.points.as_slice() {
            [a, b, c, d] => Some([*a, *b, *c, *d]),
            _ => None,
        }
    }

    /// Polyline vertices for the freehand kind.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point> {
        self.points.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect()
    }

    #[must_use]
    pub fn style(&self) -> ShapeStyle {
        ShapeStyle {
            color: self.color.clone(),
            thickness: self.thickness,
            dashed: self.dashed,
        }
    }
}

/// Whether a drag from `start` to `end` is too small to become a shape.
#[must_use]
pub fn is_tap(kind: ShapeKind, start: Point, end: Point) -> bool {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    match kind {
        ShapeKind::Arrow => dx.hypot(dy) < MIN_ARROW_LENGTH_PX,
        _ => dx.abs() < MIN_SHAPE_DELTA_PX && dy.abs() < MIN_SHAPE_DELTA_PX,
    }
}

/// Ordered list of committed shapes, in draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeList {
    shapes: Vec<Shape>,
}

impl ShapeList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents, e.g. when restoring a history entry.
    pub fn replace(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Keep only shapes matching `keep`; returns how many were removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Shape) -> bool,
    {
        let before = self.shapes.len();
        self.shapes.retain(keep);
        before - self.shapes.len()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Shape] {
        &self.shapes
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Shape> {
        self.shapes.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
