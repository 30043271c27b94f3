#![allow(clippy::float_cmp)]

use super::*;
use crate::layer::{PathOp, RasterSnapshot};
use crate::shape::Color;
use crate::testing::RecordingLayer;

fn style(dashed: bool) -> ShapeStyle {
    ShapeStyle { color: Color::from_static("#ff3b30"), thickness: 4.0, dashed }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn shape(kind: ShapeKind, start: Point, end: Point, dashed: bool) -> Shape {
    let Some(s) = Shape::from_drag(kind, start, end, &style(dashed)) else {
        panic!("test shape should not be suppressed");
    };
    s
}

fn layer() -> RecordingLayer {
    RecordingLayer::new(800, 600)
}

// =============================================================
// render_shape
// =============================================================

#[test]
fn solid_ellipse_is_one_stroke() {
    let mut l = layer();
    let e = shape(ShapeKind::Ellipse, pt(50.0, 50.0), pt(150.0, 100.0), false);
    assert!(render_shape(&mut l, &e, 1.0).is_ok());
    let strokes = l.strokes();
    assert_eq!(strokes.len(), 1);
    let (path, pen) = strokes[0];
    assert_eq!(path.ops(), &[PathOp::Ellipse { center: pt(100.0, 75.0), rx: 50.0, ry: 25.0 }]);
    assert_eq!(pen.width, 4.0);
    assert_eq!(pen.alpha, 1.0);
    assert!(pen.dash.is_empty());
}

#[test]
fn thickness_and_dash_scale_with_dpr() {
    let mut l = layer();
    let r = shape(ShapeKind::Rectangle, pt(0.0, 0.0), pt(40.0, 40.0), true);
    assert!(render_shape(&mut l, &r, 2.0).is_ok());
    let (_, pen) = l.strokes()[0];
    assert_eq!(pen.width, 8.0);
    assert_eq!(pen.dash, vec![6.0, 12.0]);
}

#[test]
fn dashed_shape_gets_white_outline_pass() {
    let mut l = layer();
    let r = shape(ShapeKind::Rectangle, pt(0.0, 0.0), pt(40.0, 40.0), true);
    assert!(render_shape(&mut l, &r, 1.0).is_ok());
    let strokes = l.strokes();
    assert_eq!(strokes.len(), 2);
    let (outline_path, outline_pen) = strokes[1];
    assert_eq!(outline_pen.color, "#ffffff");
    assert_eq!(outline_pen.width, 0.5);
    assert!(outline_pen.dash.is_empty());
    assert_eq!(outline_path, strokes[0].0);
}

#[test]
fn dashed_arrow_head_is_solid() {
    let mut l = layer();
    let a = shape(ShapeKind::Arrow, pt(0.0, 0.0), pt(100.0, 0.0), true);
    assert!(render_shape(&mut l, &a, 1.0).is_ok());
    let strokes = l.strokes();
    // shaft, head, outline
    assert_eq!(strokes.len(), 3);
    assert!(!strokes[0].1.dash.is_empty());
    assert!(strokes[1].1.dash.is_empty());
    assert_eq!(strokes[1].0.ops().len(), 4);
}

#[test]
fn freehand_renders_polyline() {
    let mut l = layer();
    let f = Shape::freehand(&[pt(0.0, 0.0), pt(5.0, 5.0), pt(10.0, 0.0)], &style(false));
    assert!(render_shape(&mut l, &f, 1.0).is_ok());
    let (path, _) = l.strokes()[0];
    assert_eq!(path.ops().len(), 3);
}

#[test]
fn render_shapes_draws_in_order() {
    let mut l = layer();
    let a = shape(ShapeKind::Rectangle, pt(0.0, 0.0), pt(10.0, 10.0), false);
    let b = shape(ShapeKind::Ellipse, pt(0.0, 0.0), pt(10.0, 10.0), false);
    assert!(render_shapes(&mut l, [&a, &b], 1.0).is_ok());
    let strokes = l.strokes();
    assert!(matches!(strokes[0].0.ops()[0], PathOp::Rect { .. }));
    assert!(matches!(strokes[1].0.ops()[0], PathOp::Ellipse { .. }));
}

// =============================================================
// Preview
// =============================================================

#[test]
fn preview_uses_reduced_alpha() {
    let mut l = layer();
    assert!(render_shape_preview(&mut l, ShapeKind::Ellipse, pt(0.0, 0.0), pt(20.0, 20.0), &style(false), 1.0).is_ok());
    assert_eq!(l.strokes()[0].1.alpha, SHAPE_PREVIEW_ALPHA);
}

#[test]
fn preview_of_tap_draws_nothing() {
    let mut l = layer();
    assert!(render_shape_preview(&mut l, ShapeKind::Rectangle, pt(0.0, 0.0), pt(1.0, 2.0), &style(false), 1.0).is_ok());
    assert!(l.ops.is_empty());
}

// =============================================================
// Arrowhead geometry
// =============================================================

#[test]
fn arrowhead_barbs_are_symmetric_at_thirty_degrees() {
    let (left, right) = arrowhead_points(pt(0.0, 0.0), pt(100.0, 0.0), 4.0);
    let len = 24.0;
    let cos30 = (std::f64::consts::PI / 6.0).cos();
    assert!((left.x - (100.0 - len * cos30)).abs() < 1e-9);
    assert!((right.x - left.x).abs() < 1e-9);
    assert!((left.y + right.y).abs() < 1e-9);
    assert!((left.y.abs() - len * 0.5).abs() < 1e-9);
}

// =============================================================
// Eraser ring
// =============================================================

#[test]
fn eraser_ring_fill_and_two_rings() {
    let mut l = layer();
    assert!(draw_eraser_ring(&mut l, pt(100.0, 100.0), 80.0).is_ok());
    let fills = l.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].1, ERASER_FILL);
    let strokes = l.strokes();
    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0].0.ops(), &[PathOp::Circle { center: pt(100.0, 100.0), radius: 40.0 }]);
    assert_eq!(strokes[1].0.ops(), &[PathOp::Circle { center: pt(100.0, 100.0), radius: 38.0 }]);
    assert_eq!(strokes[1].1.color, "rgba(255,255,255,1)");
}

#[test]
fn recording_layer_snapshot_round_trips() {
    let mut l = layer();
    assert!(draw_eraser_ring(&mut l, pt(1.0, 1.0), 10.0).is_ok());
    let snap = l.snapshot().unwrap_or_default();
    let mut other = layer();
    assert!(other.restore(&snap).is_ok());
    assert_eq!(other.marks(), l.marks());
    let wrong = RasterSnapshot { width: 1, height: 1, pixels: Vec::new() };
    assert!(other.restore(&wrong).is_err());
}
