#![allow(clippy::float_cmp)]

use super::*;

fn style() -> ShapeStyle {
    ShapeStyle { color: Color::from_static("#FF3B30"), thickness: 4.0, dashed: false }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

// =============================================================
// Color
// =============================================================

#[test]
fn color_parse_normalizes_case_and_short_form() {
    assert_eq!(Color::parse("#FF3B30").map(|c| c.to_string()), Ok("#ff3b30".to_owned()));
    assert_eq!(Color::parse(" #abc ").map(|c| c.to_string()), Ok("#aabbcc".to_owned()));
}

#[test]
fn color_parse_rejects_garbage() {
    assert!(Color::parse("ff3b30").is_err());
    assert!(Color::parse("#12").is_err());
    assert!(Color::parse("#zzzzzz").is_err());
    assert!(Color::parse("#ééé").is_err());
}

#[test]
fn color_rgba_css() {
    let c = Color::from_static("#E53935");
    assert_eq!(c.to_rgba_css(0.85), "rgba(229,57,53,0.85)");
}

#[test]
fn color_serde_round_trips_as_string() {
    let c = Color::from_static("#3FB7FF");
    let json = serde_json::to_string(&c).unwrap_or_default();
    assert_eq!(json, "\"#3fb7ff\"");
    let back: Result<Color, _> = serde_json::from_str("\"#3FB7FF\"");
    assert_eq!(back.map(|c| c.to_string()).unwrap_or_default(), "#3fb7ff");
    let bad: Result<Color, _> = serde_json::from_str("\"red\"");
    assert!(bad.is_err());
}

// =============================================================
// Shape::from_drag
// =============================================================

#[test]
fn ellipse_from_drag_stores_center_and_radii() {
    let shape = Shape::from_drag(ShapeKind::Ellipse, pt(50.0, 50.0), pt(150.0, 100.0), &style());
    let Some(shape) = shape else {
        panic!("ellipse should be created");
    };
    assert_eq!(shape.points, vec![100.0, 75.0, 50.0, 25.0]);
    assert_eq!(shape.kind, ShapeKind::Ellipse);
}

#[test]
fn ellipse_from_reverse_drag_has_positive_radii() {
    let shape = Shape::from_drag(ShapeKind::Ellipse, pt(150.0, 100.0), pt(50.0, 50.0), &style());
    assert_eq!(shape.map(|s| s.points), Some(vec![100.0, 75.0, 50.0, 25.0]));
}

#[test]
fn rectangle_from_reverse_drag_normalizes_origin() {
    let shape = Shape::from_drag(ShapeKind::Rectangle, pt(100.0, 80.0), pt(40.0, 20.0), &style());
    assert_eq!(shape.map(|s| s.points), Some(vec![40.0, 20.0, 60.0, 60.0]));
}

#[test]
fn arrow_keeps_endpoints_in_drag_order() {
    let shape = Shape::from_drag(ShapeKind::Arrow, pt(10.0, 10.0), pt(40.0, 50.0), &style());
    assert_eq!(shape.map(|s| s.points), Some(vec![10.0, 10.0, 40.0, 50.0]));
}

#[test]
fn small_drag_is_suppressed_for_box_shapes() {
    assert!(Shape::from_drag(ShapeKind::Ellipse, pt(10.0, 10.0), pt(12.9, 12.9), &style()).is_none());
    assert!(Shape::from_drag(ShapeKind::Rectangle, pt(10.0, 10.0), pt(7.5, 12.0), &style()).is_none());
}

#[test]
fn one_axis_at_threshold_is_enough() {
    assert!(Shape::from_drag(ShapeKind::Rectangle, pt(10.0, 10.0), pt(13.0, 10.0), &style()).is_some());
}

#[test]
fn short_arrow_is_suppressed_by_length() {
    // |dx| = |dy| = 3.5 passes the box rule but length 4.95 < 5.
    assert!(Shape::from_drag(ShapeKind::Arrow, pt(0.0, 0.0), pt(3.5, 3.5), &style()).is_none());
    assert!(Shape::from_drag(ShapeKind::Arrow, pt(0.0, 0.0), pt(3.0, 4.0), &style()).is_some());
}

#[test]
fn freehand_has_no_drag_form() {
    assert!(Shape::from_drag(ShapeKind::Freehand, pt(0.0, 0.0), pt(100.0, 100.0), &style()).is_none());
}

#[test]
fn shape_copies_style() {
    let dashed = ShapeStyle { dashed: true, thickness: 2.5, ..style() };
    let shape = Shape::from_drag(ShapeKind::Rectangle, pt(0.0, 0.0), pt(20.0, 20.0), &dashed);
    let Some(shape) = shape else {
        panic!("rectangle should be created");
    };
    assert!(shape.dashed);
    assert_eq!(shape.thickness, 2.5);
    assert_eq!(shape.style(), dashed);
}

// =============================================================
// Freehand
// =============================================================

#[test]
fn freehand_flattens_and_restores_vertices() {
    let path = [pt(1.0, 2.0), pt(3.0, 4.0), pt(5.0, 6.0)];
    let shape = Shape::freehand(&path, &style());
    assert_eq!(shape.points, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(shape.vertices(), path.to_vec());
    assert!(shape.quad().is_none());
}

// =============================================================
// Serde shape
// =============================================================

#[test]
fn shape_serializes_kind_as_type_field() {
    let Some(shape) = Shape::from_drag(ShapeKind::Arrow, pt(0.0, 0.0), pt(30.0, 0.0), &style()) else {
        panic!("arrow should be created");
    };
    let value = serde_json::to_value(&shape).unwrap_or_default();
    assert_eq!(value["type"], "arrow");
    assert_eq!(value["color"], "#ff3b30");
}

#[test]
fn shape_deserializes_without_dashed_field() {
    let raw = r##"{"id":"00000000-0000-0000-0000-000000000000","type":"rectangle","points":[1,2,3,4],"color":"#000000","thickness":4}"##;
    let shape: Result<Shape, _> = serde_json::from_str(raw);
    let Ok(shape) = shape else {
        panic!("legacy record should parse");
    };
    assert!(!shape.dashed);
    assert_eq!(shape.quad(), Some([1.0, 2.0, 3.0, 4.0]));
}

// =============================================================
// ShapeList
// =============================================================

#[test]
fn shape_list_push_retain_clear() {
    let mut list = ShapeList::new();
    let a = Shape::from_drag(ShapeKind::Rectangle, pt(0.0, 0.0), pt(10.0, 10.0), &style());
    let b = Shape::from_drag(ShapeKind::Ellipse, pt(0.0, 0.0), pt(10.0, 10.0), &style());
    for s in [a, b].into_iter().flatten() {
        list.push(s);
    }
    assert_eq!(list.len(), 2);
    let removed = list.retain(|s| s.kind != ShapeKind::Ellipse);
    assert_eq!(removed, 1);
    assert_eq!(list.iter().next().map(|s| s.kind), Some(ShapeKind::Rectangle));
    list.clear();
    assert!(list.is_empty());
}

#[test]
fn shape_list_get_by_id() {
    let mut list = ShapeList::new();
    let Some(shape) = Shape::from_drag(ShapeKind::Rectangle, pt(0.0, 0.0), pt(10.0, 10.0), &style()) else {
        panic!("rectangle should be created");
    };
    let id = shape.id;
    list.push(shape);
    assert!(list.get(&id).is_some());
    assert!(list.get(&Uuid::nil()).is_none());
}
