//! Eraser hit-testing against committed shapes and text boxes.
//!
//! Shapes are tested against their outline, not their interior: erasing the
//! middle of a large rectangle leaves it alone. The ellipse test uses the
//! radial approximation `|r_norm - 1| * min(rx, ry)`, which is exact on the
//! axes and good enough near the curve for eraser-sized tolerances.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{ARROW_HEAD_LENGTH_FACTOR, MIN_ERASE_TOLERANCE_PX};
use crate::coords::Point;
use crate::shape::{Shape, ShapeKind};

/// Hit tolerance for an eraser of the given diameter.
#[must_use]
pub fn erase_tolerance(eraser_size: f64) -> f64 {
    (eraser_size / 2.0).max(MIN_ERASE_TOLERANCE_PX)
}

/// Eraser tolerance widened by half the shape's painted line width, so
/// touching any visible pixel of the outline counts as a hit.
#[must_use]
pub fn shape_tolerance(shape: &Shape, eraser_tolerance: f64, dpr: f64) -> f64 {
    eraser_tolerance + shape.thickness.max(0.0) * dpr / 2.0
}

/// Whether `point` lies within `tolerance` of the shape's outline.
#[must_use]
pub fn shape_hit(shape: &Shape, point: Point, tolerance: f64) -> bool {
    let Some([a, b, c, d]) = shape.quad() else {
        return shape.kind == ShapeKind::Freehand && polyline_hit(&shape.vertices(), point, tolerance);
    };
    match shape.kind {
        ShapeKind::Ellipse => ellipse_hit(Point::new(a, b), c, d, point, tolerance),
        ShapeKind::Rectangle => rect_edge_hit(Point::new(a, b), c, d, point, tolerance),
        ShapeKind::Arrow => distance_to_segment(point, Point::new(a, b), Point::new(c, d)) <= tolerance,
        ShapeKind::Freehand => polyline_hit(&shape.vertices(), point, tolerance),
    }
}

/// Whether the segment `a`–`b`, widened by `reach`, may overlap the shape's
/// painted pixels. A bounding-box test: close shapes can report `true`.
#[must_use]
pub fn segment_near_shape(shape: &Shape, a: Point, b: Point, reach: f64, dpr: f64) -> bool {
    let Some((lo, hi)) = shape_bounds(shape) else {
        return false;
    };
    let line = shape.thickness.max(0.0) * dpr;
    let head = if shape.kind == ShapeKind::Arrow { line * ARROW_HEAD_LENGTH_FACTOR } else { 0.0 };
    let pad = reach + line / 2.0 + head;
    a.x.min(b.x) <= hi.x + pad
        && a.x.max(b.x) >= lo.x - pad
        && a.y.min(b.y) <= hi.y + pad
        && a.y.max(b.y) >= lo.y - pad
}

/// Axis-aligned bounds of the shape's geometry (line width excluded).
fn shape_bounds(shape: &Shape) -> Option<(Point, Point)> {
    let corners = match (shape.kind, shape.quad()) {
        (ShapeKind::Ellipse, Some([cx, cy, rx, ry])) => vec![Point::new(cx - rx, cy - ry), Point::new(cx + rx, cy + ry)],
        (ShapeKind::Rectangle, Some([x, y, w, h])) => vec![Point::new(x, y), Point::new(x + w, y + h)],
        _ => shape.vertices(),
    };
    let first = *corners.first()?;
    Some(corners.iter().fold((first, first), |(lo, hi), p| {
        (Point::new(lo.x.min(p.x), lo.y.min(p.y)), Point::new(hi.x.max(p.x), hi.y.max(p.y)))
    }))
}

fn ellipse_hit(center: Point, rx: f64, ry: f64, point: Point, tolerance: f64) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        // Degenerate ellipse collapses to a segment along the non-zero axis.
        let a = Point::new(center.x - rx, center.y - ry);
        let b = Point::new(center.x + rx, center.y + ry);
        return distance_to_segment(point, a, b) <= tolerance;
    }
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    let normalized = ((dx * dx) / (rx * rx) + (dy * dy) / (ry * ry)).sqrt();
    (normalized - 1.0).abs() * rx.min(ry) <= tolerance
}

fn rect_edge_hit(origin: Point, width: f64, height: f64, point: Point, tolerance: f64) -> bool {
    let (x, y) = (origin.x, origin.y);
    let within_vertical_span = point.y >= y - tolerance && point.y <= y + height + tolerance;
    let within_horizontal_span = point.x >= x - tolerance && point.x <= x + width + tolerance;
    let near_vertical_edge =
        within_vertical_span && ((point.x - x).abs() <= tolerance || (point.x - (x + width)).abs() <= tolerance);
    let near_horizontal_edge =
        within_horizontal_span && ((point.y - y).abs() <= tolerance || (point.y - (y + height)).abs() <= tolerance);
    near_vertical_edge || near_horizontal_edge
}

fn polyline_hit(vertices: &[Point], point: Point, tolerance: f64) -> bool {
    match vertices {
        [] => false,
        [only] => only.distance(point) <= tolerance,
        _ => vertices
            .windows(2)
            .any(|w| distance_to_segment(point, w[0], w[1]) <= tolerance),
    }
}

/// Shortest distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Strict containment in an axis-aligned box (edges excluded).
#[must_use]
pub fn box_contains(origin: Point, width: f64, height: f64, point: Point) -> bool {
    point.x > origin.x && point.x < origin.x + width && point.y > origin.y && point.y < origin.y + height
}
