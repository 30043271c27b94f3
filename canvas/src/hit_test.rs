use super::*;
use crate::shape::{Color, ShapeStyle};

fn style() -> ShapeStyle {
    ShapeStyle { color: Color::from_static("#ff3b30"), thickness: 4.0, dashed: false }
}

fn shape(kind: ShapeKind, start: Point, end: Point) -> Shape {
    let Some(s) = Shape::from_drag(kind, start, end, &style()) else {
        panic!("test shape should not be suppressed");
    };
    s
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

// =============================================================
// erase_tolerance
// =============================================================

#[test]
fn tolerance_is_half_the_eraser_size() {
    assert!((erase_tolerance(80.0) - 40.0).abs() < 1e-9);
}

#[test]
fn tolerance_has_a_floor() {
    assert!((erase_tolerance(1.0) - MIN_ERASE_TOLERANCE_PX).abs() < 1e-9);
}

#[test]
fn shape_tolerance_adds_half_the_line_width() {
    let s = shape(ShapeKind::Arrow, pt(0.0, 0.0), pt(100.0, 0.0));
    assert!((shape_tolerance(&s, 2.0, 1.0) - 4.0).abs() < 1e-9);
    assert!((shape_tolerance(&s, 2.0, 2.0) - 6.0).abs() < 1e-9);
}

#[test]
fn eraser_touching_the_painted_edge_hits() {
    // 9 px line: the painted edge reaches 4.5 px beyond the centerline.
    let thick = ShapeStyle { color: Color::from_static("#ff3b30"), thickness: 9.0, dashed: false };
    let Some(s) = Shape::from_drag(ShapeKind::Ellipse, pt(100.0, 100.0), pt(300.0, 300.0), &thick) else {
        panic!("test shape should not be suppressed");
    };
    let point = pt(305.0, 200.0);
    assert!(!shape_hit(&s, point, erase_tolerance(4.0)));
    assert!(shape_hit(&s, point, shape_tolerance(&s, erase_tolerance(4.0), 1.0)));
}

#[test]
fn segment_near_shape_uses_padded_bounds() {
    let rect = shape(ShapeKind::Rectangle, pt(10.0, 10.0), pt(210.0, 210.0));
    // Line half-width 2 plus reach 2: anything within 4 px of the box.
    assert!(segment_near_shape(&rect, pt(0.0, 100.0), pt(30.0, 100.0), 2.0, 1.0));
    assert!(segment_near_shape(&rect, pt(214.0, 50.0), pt(260.0, 50.0), 2.0, 1.0));
    assert!(!segment_near_shape(&rect, pt(215.0, 50.0), pt(260.0, 50.0), 2.0, 1.0));
    assert!(!segment_near_shape(&rect, pt(300.0, 300.0), pt(320.0, 300.0), 2.0, 1.0));
}

#[test]
fn arrow_bounds_include_the_head() {
    let arrow = shape(ShapeKind::Arrow, pt(0.0, 0.0), pt(100.0, 0.0));
    // Head length is 6 x 4 px.
    assert!(segment_near_shape(&arrow, pt(50.0, 20.0), pt(60.0, 20.0), 2.0, 1.0));
    assert!(!segment_near_shape(&arrow, pt(50.0, 40.0), pt(60.0, 40.0), 2.0, 1.0));
}

// =============================================================
// distance_to_segment
// =============================================================

#[test]
fn segment_distance_perpendicular() {
    let d = distance_to_segment(pt(5.0, 3.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert!((d - 3.0).abs() < 1e-9);
}

#[test]
fn segment_distance_beyond_endpoint_uses_endpoint() {
    let d = distance_to_segment(pt(13.0, 4.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert!((d - 5.0).abs() < 1e-9);
}

#[test]
fn segment_distance_degenerate_segment() {
    let d = distance_to_segment(pt(3.0, 4.0), pt(0.0, 0.0), pt(0.0, 0.0));
    assert!((d - 5.0).abs() < 1e-9);
}

// =============================================================
// Ellipse
// =============================================================

#[test]
fn ellipse_hit_on_outline() {
    // Center (100, 75), rx 50, ry 25.
    let e = shape(ShapeKind::Ellipse, pt(50.0, 50.0), pt(150.0, 100.0));
    assert!(shape_hit(&e, pt(150.0, 75.0), 2.0));
    assert!(shape_hit(&e, pt(100.0, 50.0), 2.0));
}

#[test]
fn ellipse_miss_at_center_with_small_tolerance() {
    let e = shape(ShapeKind::Ellipse, pt(50.0, 50.0), pt(150.0, 100.0));
    assert!(!shape_hit(&e, pt(100.0, 75.0), 5.0));
}

#[test]
fn ellipse_center_hit_with_large_tolerance() {
    // |0 - 1| * min(50, 25) = 25
    let e = shape(ShapeKind::Ellipse, pt(50.0, 50.0), pt(150.0, 100.0));
    assert!(shape_hit(&e, pt(100.0, 75.0), 25.0));
}

#[test]
fn flat_ellipse_is_tested_as_segment() {
    let e = shape(ShapeKind::Ellipse, pt(0.0, 10.0), pt(40.0, 10.0));
    assert!(shape_hit(&e, pt(20.0, 11.0), 2.0));
    assert!(!shape_hit(&e, pt(20.0, 20.0), 2.0));
}

// =============================================================
// Rectangle
// =============================================================

#[test]
fn rectangle_hit_on_each_edge() {
    let r = shape(ShapeKind::Rectangle, pt(10.0, 10.0), pt(110.0, 60.0));
    assert!(shape_hit(&r, pt(10.0, 30.0), 2.0));
    assert!(shape_hit(&r, pt(110.0, 30.0), 2.0));
    assert!(shape_hit(&r, pt(50.0, 10.0), 2.0));
    assert!(shape_hit(&r, pt(50.0, 61.5), 2.0));
}

#[test]
fn rectangle_interior_is_not_hit() {
    let r = shape(ShapeKind::Rectangle, pt(10.0, 10.0), pt(110.0, 60.0));
    assert!(!shape_hit(&r, pt(60.0, 35.0), 5.0));
}

#[test]
fn rectangle_edge_extension_outside_span_is_not_hit() {
    let r = shape(ShapeKind::Rectangle, pt(10.0, 10.0), pt(110.0, 60.0));
    // On the line x = 10 but far below the rectangle.
    assert!(!shape_hit(&r, pt(10.0, 200.0), 2.0));
}

// =============================================================
// Arrow / freehand
// =============================================================

#[test]
fn arrow_hit_along_shaft() {
    let a = shape(ShapeKind::Arrow, pt(0.0, 0.0), pt(100.0, 100.0));
    assert!(shape_hit(&a, pt(51.0, 49.0), 2.0));
    assert!(!shape_hit(&a, pt(80.0, 20.0), 2.0));
}

#[test]
fn freehand_hit_along_any_segment() {
    let f = Shape::freehand(&[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)], &style());
    assert!(shape_hit(&f, pt(10.5, 5.0), 1.0));
    assert!(!shape_hit(&f, pt(5.0, 5.0), 1.0));
}

#[test]
fn freehand_single_point() {
    let f = Shape::freehand(&[pt(3.0, 3.0)], &style());
    assert!(shape_hit(&f, pt(3.5, 3.0), 1.0));
}

// =============================================================
// box_contains
// =============================================================

#[test]
fn box_contains_is_strict() {
    let origin = pt(10.0, 10.0);
    assert!(box_contains(origin, 100.0, 50.0, pt(50.0, 30.0)));
    assert!(!box_contains(origin, 100.0, 50.0, pt(10.0, 30.0)));
    assert!(!box_contains(origin, 100.0, 50.0, pt(50.0, 60.0)));
}
