//! The raster layer abstraction the drawing surface paints through.
//!
//! [`Layer`] is the seam between annotation logic and the browser: the web
//! implementation lives in [`crate::render`], tests use an in-memory recorder.
//! Paths are built as plain values ([`Path`]) and handed over together with a
//! [`Pen`], so a layer never carries hidden stroke state between calls.

use serde::{Deserialize, Serialize};

use crate::coords::{Point, Size};

/// Error raised by a layer backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerError {
    #[error("canvas call failed: {0}")]
    Backend(String),
    #[error("snapshot is {got_w}x{got_h}, layer is {want_w}x{want_h}")]
    SizeMismatch { got_w: u32, got_h: u32, want_w: u32, want_h: u32 },
    #[error("image source unavailable: {0}")]
    Image(String),
}

/// How new paint combines with what is already on the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    #[default]
    SourceOver,
    /// Clears existing pixels under the paint (eraser).
    DestinationOut,
}

impl Composite {
    /// The Canvas 2D `globalCompositeOperation` name.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::DestinationOut => "destination-out",
        }
    }
}

/// Stroke parameters for one paint call. Joins and caps are always round.
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub color: String,
    pub width: f64,
    pub alpha: f64,
    pub dash: Vec<f64>,
    pub composite: Composite,
}

impl Pen {
    /// Opaque solid pen.
    #[must_use]
    pub fn solid(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            alpha: 1.0,
            dash: Vec::new(),
            composite: Composite::SourceOver,
        }
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn with_dash(mut self, dash: Vec<f64>) -> Self {
        self.dash = dash;
        self
    }

    #[must_use]
    pub fn with_composite(mut self, composite: Composite) -> Self {
        self.composite = composite;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    Rect { origin: Point, width: f64, height: f64 },
    Ellipse { center: Point, rx: f64, ry: f64 },
    /// Full circle.
    Circle { center: Point, radius: f64 },
}

/// An open sequence of path operations, replayed by [`Layer::stroke`] and [`Layer::fill`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    ops: Vec<PathOp>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A polyline through `points`.
    #[must_use]
    pub fn polyline(points: &[Point]) -> Self {
        let mut path = Self::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            path.move_to(*first);
        }
        for p in iter {
            path.line_to(*p);
        }
        path
    }

    /// Single segment `a`–`b`.
    #[must_use]
    pub fn segment(a: Point, b: Point) -> Self {
        Self::polyline(&[a, b])
    }

    #[must_use]
    pub fn circle(center: Point, radius: f64) -> Self {
        let mut path = Self::new();
        path.ops.push(PathOp::Circle { center, radius: radius.max(0.0) });
        path
    }

    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.ops.push(PathOp::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.ops.push(PathOp::LineTo(p));
        self
    }

    pub fn rect(&mut self, origin: Point, width: f64, height: f64) -> &mut Self {
        self.ops.push(PathOp::Rect { origin, width, height });
        self
    }

    pub fn ellipse(&mut self, center: Point, rx: f64, ry: f64) -> &mut Self {
        self.ops.push(PathOp::Ellipse { center, rx: rx.max(0.0), ry: ry.max(0.0) });
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Raw RGBA copy of a layer, used for synchronous undo/redo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RasterSnapshot {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// An image reference with its natural size, as stored in records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A decoded image a layer can draw.
pub trait RasterImage {
    /// Natural pixel size of the image.
    fn natural_size(&self) -> Size;
}

impl RasterImage for ImageSource {
    fn natural_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// A same-sized 2D raster the surface paints on.
///
/// # Errors
///
/// Fallible methods return [`LayerError`] when the backend rejects the call.
pub trait Layer: Sized {
    /// Decoded image type accepted by [`Layer::draw_image`].
    type Image: RasterImage;

    /// Backing size in pixels.
    fn size(&self) -> Size;

    /// Change the backing size. Content is discarded.
    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    fn stroke(&mut self, path: &Path, pen: &Pen) -> Result<(), LayerError>;

    fn fill(&mut self, path: &Path, color: &str) -> Result<(), LayerError>;

    /// Composite `src` over this layer at the given alpha.
    fn draw_layer(&mut self, src: &Self, alpha: f64) -> Result<(), LayerError>;

    /// Draw a decoded image scaled to fill the layer.
    fn draw_image(&mut self, image: &Self::Image) -> Result<(), LayerError>;

    fn snapshot(&self) -> Result<RasterSnapshot, LayerError>;

    fn restore(&mut self, snapshot: &RasterSnapshot) -> Result<(), LayerError>;

    /// Host encoding of the current pixels (a PNG data URL on the web).
    fn encode(&self) -> Result<String, LayerError>;

    /// Whether any pixel is non-transparent. Cost is linear in pixel count.
    fn has_ink(&self) -> Result<bool, LayerError>;

    /// An empty offscreen layer of the same size.
    fn sibling(&self) -> Result<Self, LayerError>;
}
