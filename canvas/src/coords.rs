//! Coordinate mapping between the three spaces the editor deals with:
//!
//! - **CSS space**: pixels as laid out by the browser (pointer events, text overlay).
//! - **Backing space**: the canvas pixel buffer, usually the source image's
//!   native size and therefore independent of the displayed size.
//! - **Normalized space**: `[0, 1] x [0, 1]` fractions of an image's native
//!   size, used for floor-plan pins so they survive zoom, pan and resizing.
//!
//! Every conversion goes through this module; nothing else divides
//! `canvas.width` by a bounding rect. All functions are total. Callers must
//! check [`Size::is_empty`] before mapping against a zero-sized canvas.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use serde::{Deserialize, Serialize};

/// A point in any of the three spaces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Width and height of a canvas, image or viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero or negative. Mapping against an
    /// empty size is undefined; guard with this first.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Map a CSS-space point onto the backing store.
///
/// Each axis scales independently, so a canvas stretched non-uniformly by CSS
/// still maps exactly.
#[must_use]
pub fn to_backing_pixels(css: Point, css_size: Size, backing: Size) -> Point {
    Point {
        x: css.x * (backing.width / css_size.width),
        y: css.y * (backing.height / css_size.height),
    }
}

/// Inverse of [`to_backing_pixels`].
#[must_use]
pub fn backing_to_css(backing_pt: Point, css_size: Size, backing: Size) -> Point {
    Point {
        x: backing_pt.x * (css_size.width / backing.width),
        y: backing_pt.y * (css_size.height / backing.height),
    }
}

/// Clamp into `[-margin, dim + margin]` on each axis.
///
/// Strokes may begin or continue slightly past the edge, which keeps fast
/// strokes that overshoot the canvas from snapping back onto the border.
#[must_use]
pub fn clamp_extended(point: Point, bounds: Size, margin: f64) -> Point {
    Point {
        x: point.x.clamp(-margin, bounds.width + margin),
        y: point.y.clamp(-margin, bounds.height + margin),
    }
}

/// Absolute image pixels to `[0, 1]` fractions of the image.
#[must_use]
pub fn normalize(point: Point, image_width: f64, image_height: f64) -> Point {
    Point {
        x: point.x / image_width,
        y: point.y / image_height,
    }
}

/// `[0, 1]` fractions back to absolute image pixels.
#[must_use]
pub fn denormalize(point: Point, image_width: f64, image_height: f64) -> Point {
    Point {
        x: point.x * image_width,
        y: point.y * image_height,
    }
}

/// Pointer position in CSS space relative to an element's bounding rect.
#[must_use]
pub fn css_from_client(client: Point, rect_left: f64, rect_top: f64) -> Point {
    Point {
        x: client.x - rect_left,
        y: client.y - rect_top,
    }
}
