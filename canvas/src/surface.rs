//! The layered drawing surface of one editing session.
//!
//! DESIGN
//! ======
//! Four same-sized visible layers, bottom to top:
//!
//! | Layer | Holds |
//! |-------|-------|
//! | base | the source image, never painted over |
//! | preview | the in-progress highlighter path or shape drag |
//! | ink | committed ink: freehand strokes plus rendered shapes |
//! | overlay | UI chrome (the eraser cursor ring) |
//!
//! Next to them the surface keeps an offscreen `strokes` layer holding the
//! freehand ink alone. Pen and eraser segments go to both `strokes` and `ink`;
//! committed shapes are rendered onto `ink` only. When the eraser removes a
//! shape, `ink` is rebuilt as `strokes` plus the remaining shapes, so a removed
//! shape never lingers in the pixels. History snapshots and the saved record
//! carry `strokes` and the shape list separately for the same reason.
//!
//! Freehand ink is raster-only: the eraser clears its pixels with
//! `destination-out`, it is never split into vector strokes. Shapes are only
//! ever removed whole, so after each eraser segment the shapes it may have cut
//! into are painted again on top of `ink`. Shapes sit above freehand ink in
//! every rebuild too, so the screen keeps matching the exported composite.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use tracing::{trace, warn};

use crate::consts::{EXTEND_MARGIN_PX, HIGHLIGHT_ALPHA, MIN_SHAPE_DELTA_PX};
use crate::coords::{Point, Size, backing_to_css, clamp_extended, to_backing_pixels};
use crate::hit::{erase_tolerance, segment_near_shape, shape_hit, shape_tolerance};
use crate::layer::{Composite, Layer, LayerError, Path, Pen, RasterImage, RasterSnapshot};
use crate::paint;
use crate::shape::{Color, Shape, ShapeId, ShapeKind, ShapeList, ShapeStyle};
use crate::text::{TextBox, TextId, TextLayer};

/// The four visible layers.
#[derive(Debug)]
pub struct LayerStack<L> {
    pub base: L,
    pub preview: L,
    pub ink: L,
    pub overlay: L,
}

/// What an in-progress stroke paints with.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Pen { color: Color, size: f64 },
    Highlighter { color: Color, size: f64 },
    Eraser { size: f64 },
    Shape { kind: ShapeKind, style: ShapeStyle },
}

/// Undoable content: freehand raster, the shape list and the text boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct InkState {
    pub raster: RasterSnapshot,
    pub shapes: Vec<Shape>,
    pub texts: Vec<TextBox>,
}

/// How a stroke ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// Pixels or shapes changed.
    Committed,
    /// A new shape was added.
    ShapeCommitted(ShapeId),
    /// Too small to count; nothing changed.
    Suppressed,
    /// No stroke was in progress.
    Idle,
}

impl StrokeOutcome {
    /// Whether the content changed and history should capture.
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Committed | Self::ShapeCommitted(_))
    }
}

/// What [`DrawingSurface::erase_at`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Erased {
    pub shapes: usize,
    pub texts: Vec<TextId>,
}

impl Erased {
    #[must_use]
    pub fn any(&self) -> bool {
        self.shapes > 0 || !self.texts.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    brush: Brush,
    start: Point,
    last: Point,
    points: Vec<Point>,
    changed: bool,
}

/// Layers, shapes and text boxes of the open target.
pub struct DrawingSurface<L: Layer> {
    layers: LayerStack<L>,
    strokes: L,
    shapes: ShapeList,
    texts: TextLayer,
    stroke: Option<ActiveStroke>,
    css_size: Size,
    dpr: f64,
    margin: f64,
    highlight_alpha: f64,
    eraser_visible: bool,
}

impl<L: Layer> DrawingSurface<L> {
    /// Build a surface over the visible layers; the offscreen stroke layer is
    /// derived from `ink`.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot create the offscreen layer.
    pub fn new(layers: LayerStack<L>, dpr: f64) -> Result<Self, LayerError> {
        let strokes = layers.ink.sibling()?;
        Ok(Self {
            layers,
            strokes,
            shapes: ShapeList::new(),
            texts: TextLayer::new(),
            stroke: None,
            css_size: Size::default(),
            dpr: if dpr > 0.0 { dpr } else { 1.0 },
            margin: EXTEND_MARGIN_PX,
            highlight_alpha: HIGHLIGHT_ALPHA,
            eraser_visible: false,
        })
    }

    /// Override the tunables normally taken from the editor config.
    pub fn configure(&mut self, margin: f64, highlight_alpha: f64) {
        self.margin = margin;
        self.highlight_alpha = highlight_alpha;
    }

    // --- Geometry ---

    /// Backing size shared by every layer.
    #[must_use]
    pub fn size(&self) -> Size {
        self.layers.ink.size()
    }

    /// Displayed (CSS) size of the stack.
    #[must_use]
    pub fn css_size(&self) -> Size {
        self.css_size
    }

    pub fn set_css_size(&mut self, css: Size) {
        self.css_size = css;
    }

    #[must_use]
    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn set_dpr(&mut self, dpr: f64) {
        if dpr > 0.0 {
            self.dpr = dpr;
        }
    }

    /// Map a CSS point to backing pixels, or `None` while either size is empty.
    #[must_use]
    pub fn to_backing(&self, css: Point) -> Option<Point> {
        let backing = self.size();
        if self.css_size.is_empty() || backing.is_empty() {
            return None;
        }
        Some(to_backing_pixels(css, self.css_size, backing))
    }

    fn to_css(&self, backing_pt: Point) -> Option<Point> {
        let backing = self.size();
        if self.css_size.is_empty() || backing.is_empty() {
            return None;
        }
        Some(backing_to_css(backing_pt, self.css_size, backing))
    }

    /// Size every layer to the image's natural size. Content is discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        for layer in self.layers_mut() {
            layer.resize(width, height);
        }
        self.strokes.resize(width, height);
    }

    fn layers_mut(&mut self) -> [&mut L; 4] {
        let LayerStack { base, preview, ink, overlay } = &mut self.layers;
        [base, preview, ink, overlay]
    }

    // --- Content ---

    #[must_use]
    pub fn shapes(&self) -> &ShapeList {
        &self.shapes
    }

    #[must_use]
    pub fn texts(&self) -> &TextLayer {
        &self.texts
    }

    pub fn texts_mut(&mut self) -> &mut TextLayer {
        &mut self.texts
    }

    #[must_use]
    pub fn layers(&self) -> &LayerStack<L> {
        &self.layers
    }

    /// Freehand ink without shapes.
    #[must_use]
    pub fn stroke_layer(&self) -> &L {
        &self.strokes
    }

    /// Clear every layer, the shape list, text boxes and any gesture.
    pub fn reset(&mut self) {
        for layer in self.layers_mut() {
            layer.clear();
        }
        self.strokes.clear();
        self.shapes.clear();
        self.texts.clear();
        self.stroke = None;
        self.eraser_visible = false;
    }

    /// Draw the source image on the base layer, sizing the stack to it. A
    /// missing image leaves the base blank; the surface stays usable.
    pub fn load_base(&mut self, image: Option<&L::Image>) -> bool {
        let Some(image) = image else {
            warn!("surface: no base image; starting blank");
            return false;
        };
        let natural = image.natural_size();
        if natural.is_empty() {
            warn!(width = natural.width, height = natural.height, "surface: base image has no size");
            return false;
        }
        self.resize(px(natural.width), px(natural.height));
        match self.layers.base.draw_image(image) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "surface: failed to draw base image");
                false
            }
        }
    }

    /// Draw previously saved freehand ink. Failure leaves the ink blank.
    pub fn load_ink(&mut self, image: &L::Image) -> bool {
        if let Err(e) = self.strokes.draw_image(image) {
            warn!(error = %e, "surface: failed to draw saved ink");
            return false;
        }
        self.redraw_ink_or_warn();
        true
    }

    /// Replace the shape list and redraw.
    pub fn load_shapes(&mut self, shapes: Vec<Shape>) {
        self.shapes.replace(shapes);
        self.redraw_ink_or_warn();
    }

    /// Wipe freehand ink and shapes. Text boxes stay.
    pub fn clear_ink(&mut self) {
        self.layers.ink.clear();
        self.layers.preview.clear();
        self.strokes.clear();
        self.shapes.clear();
        self.stroke = None;
    }

    /// Whether anything is drawn. Scans the whole stroke layer.
    ///
    /// # Errors
    ///
    /// Fails if the pixel scan fails.
    pub fn has_ink(&self) -> Result<bool, LayerError> {
        if !self.shapes.is_empty() {
            return Ok(true);
        }
        self.strokes.has_ink()
    }

    // --- Strokes ---

    #[must_use]
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Start a stroke at `origin` (backing px). Any unfinished stroke is dropped.
    pub fn begin_stroke(&mut self, brush: Brush, origin: Point) {
        let p = self.clamp(origin);
        if matches!(brush, Brush::Highlighter { .. } | Brush::Shape { .. }) {
            self.layers.preview.clear();
        }
        self.stroke = Some(ActiveStroke { brush, start: p, last: p, points: vec![p], changed: false });
    }

    /// Continue the stroke to `point` (backing px).
    ///
    /// Pen and eraser paint only the new segment; the eraser also repaints
    /// shapes close to it. Highlighter and shape repaint the preview layer.
    ///
    /// # Errors
    ///
    /// Propagates layer failures.
    pub fn extend_stroke(&mut self, point: Point) -> Result<(), LayerError> {
        let p = self.clamp(point);
        let Some(stroke) = self.stroke.as_mut() else {
            return Ok(());
        };
        let from = stroke.last;
        stroke.last = p;
        match &stroke.brush {
            Brush::Pen { color, size } => {
                let pen = Pen::solid(color.as_str(), *size);
                stroke.changed = true;
                let segment = Path::segment(from, p);
                self.strokes.stroke(&segment, &pen)?;
                self.layers.ink.stroke(&segment, &pen)
            }
            Brush::Eraser { size } => {
                let reach = *size / 2.0;
                let pen = Pen::solid("rgba(0,0,0,1)", *size).with_composite(Composite::DestinationOut);
                stroke.changed = true;
                let segment = Path::segment(from, p);
                self.strokes.stroke(&segment, &pen)?;
                self.layers.ink.stroke(&segment, &pen)?;
                self.repaint_shapes_near(from, p, reach)
            }
            Brush::Highlighter { color, size } => {
                stroke.points.push(p);
                let pen = Pen::solid(color.as_str(), *size);
                let path = Path::polyline(&stroke.points);
                self.layers.preview.clear();
                self.layers.preview.stroke(&path, &pen)
            }
            Brush::Shape { kind, style } => {
                let (kind, style, start) = (*kind, style.clone(), stroke.start);
                self.layers.preview.clear();
                paint::render_shape_preview(&mut self.layers.preview, kind, start, p, &style, self.dpr)
            }
        }
    }

    /// Finish the stroke.
    ///
    /// # Errors
    ///
    /// Propagates layer failures; the stroke is dropped either way.
    pub fn commit_stroke(&mut self) -> Result<StrokeOutcome, LayerError> {
        let Some(stroke) = self.stroke.take() else {
            return Ok(StrokeOutcome::Idle);
        };
        match stroke.brush {
            Brush::Pen { .. } | Brush::Eraser { .. } => {
                if stroke.changed {
                    Ok(StrokeOutcome::Committed)
                } else {
                    Ok(StrokeOutcome::Suppressed)
                }
            }
            Brush::Highlighter { .. } => {
                if Self::is_tap_path(&stroke.points) {
                    trace!("surface: highlighter tap suppressed");
                    self.layers.preview.clear();
                    return Ok(StrokeOutcome::Suppressed);
                }
                self.strokes.draw_layer(&self.layers.preview, self.highlight_alpha)?;
                self.layers.ink.draw_layer(&self.layers.preview, self.highlight_alpha)?;
                self.layers.preview.clear();
                Ok(StrokeOutcome::Committed)
            }
            Brush::Shape { kind, style } => {
                self.layers.preview.clear();
                let Some(shape) = Shape::from_drag(kind, stroke.start, stroke.last, &style) else {
                    trace!(?kind, "surface: shape tap suppressed");
                    return Ok(StrokeOutcome::Suppressed);
                };
                let id = shape.id;
                paint::render_shape(&mut self.layers.ink, &shape, self.dpr)?;
                self.shapes.push(shape);
                Ok(StrokeOutcome::ShapeCommitted(id))
            }
        }
    }

    /// Drop the stroke without committing (Escape). Already-painted pen or
    /// eraser segments stay.
    pub fn cancel_stroke(&mut self) -> bool {
        if self.stroke.take().is_none() {
            return false;
        }
        self.layers.preview.clear();
        true
    }

    /// Mark the active eraser stroke as having changed content.
    fn note_change(&mut self) {
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.changed = true;
        }
    }

    fn is_tap_path(points: &[Point]) -> bool {
        let Some(first) = points.first() else {
            return true;
        };
        let (mut min, mut max) = (*first, *first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        max.x - min.x < MIN_SHAPE_DELTA_PX && max.y - min.y < MIN_SHAPE_DELTA_PX
    }

    fn clamp(&self, p: Point) -> Point {
        let size = self.size();
        if size.is_empty() {
            return p;
        }
        clamp_extended(p, size, self.margin)
    }

    // --- Eraser ---

    /// Remove shapes whose painted outline comes within the eraser radius of
    /// `point` (backing px) and text boxes containing it. Removed shapes disappear
    /// from the ink layer immediately.
    ///
    /// # Errors
    ///
    /// Propagates layer failures while redrawing.
    pub fn erase_at(&mut self, point: Point, size: f64) -> Result<Erased, LayerError> {
        let (tolerance, dpr) = (erase_tolerance(size), self.dpr);
        let shapes = self.shapes.retain(|s| !shape_hit(s, point, shape_tolerance(s, tolerance, dpr)));
        let texts = match self.to_css(point) {
            Some(css) => self.texts.erase_at(css),
            None => Vec::new(),
        };
        let erased = Erased { shapes, texts };
        if erased.shapes > 0 {
            self.redraw_ink()?;
        }
        if erased.any() {
            self.note_change();
        }
        Ok(erased)
    }

    /// Draw the eraser cursor ring at `center` (backing px).
    ///
    /// # Errors
    ///
    /// Propagates layer failures.
    pub fn show_eraser_cursor(&mut self, center: Point, size: f64) -> Result<(), LayerError> {
        self.layers.overlay.clear();
        paint::draw_eraser_ring(&mut self.layers.overlay, center, size)?;
        self.eraser_visible = true;
        Ok(())
    }

    pub fn hide_eraser_cursor(&mut self) {
        if self.eraser_visible {
            self.layers.overlay.clear();
            self.eraser_visible = false;
        }
    }

    #[must_use]
    pub fn eraser_cursor_visible(&self) -> bool {
        self.eraser_visible
    }

    // --- Redraw / history ---

    /// Rebuild the ink layer from the freehand strokes and the shape list.
    ///
    /// # Errors
    ///
    /// Propagates layer failures.
    pub fn redraw_ink(&mut self) -> Result<(), LayerError> {
        self.layers.ink.clear();
        self.layers.ink.draw_layer(&self.strokes, 1.0)?;
        paint::render_shapes(&mut self.layers.ink, self.shapes.iter(), self.dpr)
    }

    /// Paint shapes the segment `a`–`b` may have cut into back over `ink`.
    fn repaint_shapes_near(&mut self, a: Point, b: Point, reach: f64) -> Result<(), LayerError> {
        let dpr = self.dpr;
        let near = self.shapes.iter().filter(|s| segment_near_shape(s, a, b, reach, dpr));
        paint::render_shapes(&mut self.layers.ink, near, dpr)
    }

    fn redraw_ink_or_warn(&mut self) {
        if let Err(e) = self.redraw_ink() {
            warn!(error = %e, "surface: ink redraw failed");
        }
    }

    /// Capture undoable content.
    ///
    /// # Errors
    ///
    /// Fails if the stroke layer cannot be read.
    pub fn snapshot(&self) -> Result<InkState, LayerError> {
        Ok(InkState { raster: self.strokes.snapshot()?, shapes: self.shapes.to_vec(), texts: self.texts.to_vec() })
    }

    /// Restore content captured by [`DrawingSurface::snapshot`].
    ///
    /// # Errors
    ///
    /// Fails if the raster does not fit the layer or a redraw fails.
    pub fn restore(&mut self, state: &InkState) -> Result<(), LayerError> {
        self.stroke = None;
        self.layers.preview.clear();
        self.strokes.restore(&state.raster)?;
        self.shapes.replace(state.shapes.clone());
        self.texts.replace(state.texts.clone());
        self.redraw_ink()
    }

    // --- Export ---

    /// Encoded freehand ink, without shapes.
    ///
    /// # Errors
    ///
    /// Fails if encoding fails.
    pub fn encode_ink(&self) -> Result<String, LayerError> {
        self.strokes.encode()
    }

    /// Base, freehand ink and shapes flattened and encoded.
    ///
    /// # Errors
    ///
    /// Fails if the scratch layer cannot be created or drawn.
    pub fn encode_composite(&self) -> Result<String, LayerError> {
        let mut scratch = self.layers.base.sibling()?;
        scratch.draw_layer(&self.layers.base, 1.0)?;
        scratch.draw_layer(&self.strokes, 1.0)?;
        paint::render_shapes(&mut scratch, self.shapes.iter(), self.dpr)?;
        scratch.encode()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn px(v: f64) -> u32 {
    v.round().clamp(0.0, f64::from(u32::MAX)) as u32
}
