//! Paint routines shared by the live surface, history restore and export.
//!
//! These are the only functions that turn a [`Shape`] into layer calls, so
//! the on-screen ink, the undo replay and the exported composite always draw
//! identical geometry.

#[cfg(test)]
#[path = "paint_test.rs"]
mod paint_test;

use crate::consts::{
    ARROW_HEAD_HALF_ANGLE, ARROW_HEAD_LENGTH_FACTOR, DASH_PATTERN, DASHED_OUTLINE_PX, ERASER_FILL, ERASER_RING_INSET_PX,
    SHAPE_PREVIEW_ALPHA,
};
use crate::coords::Point;
use crate::layer::{Layer, LayerError, Path, Pen};
use crate::shape::{Shape, ShapeKind, ShapeStyle};

/// Draw a committed shape at full opacity.
///
/// # Errors
///
/// Propagates the first failing layer call.
pub fn render_shape<L: Layer>(layer: &mut L, shape: &Shape, dpr: f64) -> Result<(), LayerError> {
    render_with_alpha(layer, shape, dpr, 1.0)
}

/// Draw every shape in order.
///
/// # Errors
///
/// Propagates the first failing layer call.
pub fn render_shapes<'a, L, I>(layer: &mut L, shapes: I, dpr: f64) -> Result<(), LayerError>
where
    L: Layer,
    I: IntoIterator<Item = &'a Shape>,
{
    for shape in shapes {
        render_shape(layer, shape, dpr)?;
    }
    Ok(())
}

/// Draw the live preview of a shape drag. Nothing is drawn for a drag that
/// would be suppressed on release.
///
/// # Errors
///
/// Propagates the first failing layer call.
pub fn render_shape_preview<L: Layer>(
    layer: &mut L,
    kind: ShapeKind,
    start: Point,
    end: Point,
    style: &ShapeStyle,
    dpr: f64,
) -> Result<(), LayerError> {
    let Some(shape) = Shape::from_drag(kind, start, end, style) else {
        return Ok(());
    };
    render_with_alpha(layer, &shape, dpr, SHAPE_PREVIEW_ALPHA)
}

fn render_with_alpha<L: Layer>(layer: &mut L, shape: &Shape, dpr: f64, alpha: f64) -> Result<(), LayerError> {
    let pen = shape_pen(&shape.style(), dpr).with_alpha(alpha);
    let Some(path) = outline_path(shape) else {
        return Ok(());
    };
    layer.stroke(&path, &pen)?;

    if shape.kind == ShapeKind::Arrow {
        if let Some([x1, y1, x2, y2]) = shape.quad() {
            let (left, right) = arrowhead_points(Point::new(x1, y1), Point::new(x2, y2), pen.width);
            let tip = Point::new(x2, y2);
            let mut head = Path::new();
            head.move_to(tip).line_to(left).move_to(tip).line_to(right);
            // Head stays solid even when the shaft is dashed.
            layer.stroke(&head, &pen.clone().with_dash(Vec::new()))?;
        }
    }

    if shape.dashed {
        let outline = Pen::solid("#ffffff", DASHED_OUTLINE_PX * dpr);
        layer.stroke(&path, &outline)?;
    }
    Ok(())
}

/// Stroke pen for a shape style: width and dash scale with the device pixel ratio.
#[must_use]
pub fn shape_pen(style: &ShapeStyle, dpr: f64) -> Pen {
    let pen = Pen::solid(style.color.as_str(), style.thickness * dpr);
    if style.dashed {
        pen.with_dash(DASH_PATTERN.iter().map(|d| d * dpr).collect())
    } else {
        pen
    }
}

/// The stroked outline of a shape; the arrow's shaft only.
#[must_use]
pub fn outline_path(shape: &Shape) -> Option<Path> {
    let mut path = Path::new();
    match shape.kind {
        ShapeKind::Freehand => {
            let polyline = Path::polyline(&shape.vertices());
            return (!polyline.is_empty()).then_some(polyline);
        }
        ShapeKind::Ellipse => {
            let [cx, cy, rx, ry] = shape.quad()?;
            path.ellipse(Point::new(cx, cy), rx, ry);
        }
        ShapeKind::Rectangle => {
            let [x, y, w, h] = shape.quad()?;
            path.rect(Point::new(x, y), w, h);
        }
        ShapeKind::Arrow => {
            let [x1, y1, x2, y2] = shape.quad()?;
            path.move_to(Point::new(x1, y1)).line_to(Point::new(x2, y2));
        }
    }
    Some(path)
}

/// The two barb ends of an arrowhead at `tip`, for a shaft of the given
/// stroke width.
#[must_use]
pub fn arrowhead_points(tail: Point, tip: Point, stroke_width: f64) -> (Point, Point) {
    let length = stroke_width * ARROW_HEAD_LENGTH_FACTOR;
    let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
    let barb = |a: f64| Point::new(tip.x - length * a.cos(), tip.y - length * a.sin());
    (barb(angle - ARROW_HEAD_HALF_ANGLE), barb(angle + ARROW_HEAD_HALF_ANGLE))
}

/// Eraser cursor: translucent disc, black ring at the brush radius, white
/// ring just inside it.
///
/// # Errors
///
/// Propagates the first failing layer call.
pub fn draw_eraser_ring<L: Layer>(layer: &mut L, center: Point, size: f64) -> Result<(), LayerError> {
    let outer = size / 2.0;
    let inner = (outer - ERASER_RING_INSET_PX).max(0.0);
    layer.fill(&Path::circle(center, outer), ERASER_FILL)?;
    layer.stroke(&Path::circle(center, outer), &Pen::solid("rgba(0,0,0,1)", 1.0))?;
    layer.stroke(&Path::circle(center, inner), &Pen::solid("rgba(255,255,255,1)", 1.0))
}
