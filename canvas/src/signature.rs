//! Signature pad: a second, pen-only drawing session with its own history.
//!
//! DESIGN
//! ======
//! The visible pad is one layer painted white with black ink on top. Ink is
//! also kept on an offscreen transparent layer, so "has the user signed" is a
//! scan for any non-transparent pixel there rather than for any non-white
//! pixel on the pad. Undo snapshots that offscreen layer and the pad is
//! repainted from it.
//!
//! The saved signature is the pad itself (black on white PNG), stored as a
//! bare data URL under one global key. Saving a blank pad removes the key.

#[cfg(test)]
#[path = "signature_test.rs"]
mod signature_test;

use store::KeyValueStore;
use tracing::{debug, info, warn};
use web_sys::{HtmlCanvasElement, HtmlImageElement};

use crate::config::EditorConfig;
use crate::coords::{Point, Size, clamp_extended, css_from_client, to_backing_pixels};
use crate::engine::{Action, EditorError, apply_pointer_actions, decoded};
use crate::history::HistoryStack;
use crate::layer::{Layer, LayerError, Path, Pen, RasterSnapshot};
use crate::render::CanvasLayer;

/// Store key of the saved signature PNG.
pub const SIGNATURE_KEY: &str = "JL_signature_png";

const PAD_FILL: &str = "#ffffff";
const INK_COLOR: &str = "#000000";
/// Line width in CSS px; scaled by the device pixel ratio.
const INK_WIDTH_CSS: f64 = 2.0;
/// Smallest backing dimension of the pad.
const MIN_PAD_PX: u32 = 8;

/// Result of [`SignatureCore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Ink was found and written.
    Signed,
    /// The pad was blank; any stored signature was removed.
    Blank,
    /// The store rejected the write.
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct PadStroke {
    last: Point,
    pointer_id: Option<i32>,
    drawn: bool,
}

/// Signature session state, independent of the browser.
pub struct SignatureCore<L: Layer> {
    pad: L,
    ink: L,
    history: HistoryStack<RasterSnapshot>,
    stroke: Option<PadStroke>,
    css_size: Size,
    dpr: f64,
    margin: f64,
}

impl<L: Layer> SignatureCore<L> {
    /// # Errors
    ///
    /// Fails if `config` is out of range or the offscreen ink layer cannot be
    /// created.
    pub fn new(pad: L, dpr: f64, config: &EditorConfig) -> Result<Self, EditorError> {
        config.validate()?;
        let ink = pad.sibling()?;
        Ok(Self {
            pad,
            ink,
            history: HistoryStack::new(config.history_cap, config.history_debounce_ms),
            stroke: None,
            css_size: Size::default(),
            dpr: if dpr > 0.0 { dpr } else { 1.0 },
            margin: config.extend_margin_px,
        })
    }

    /// Size the pad to its box, paint it white and draw a previously saved
    /// signature. The loaded state becomes the first history entry.
    pub fn open(&mut self, saved: Option<&L::Image>, css_size: Size, now_ms: f64) -> Vec<Action> {
        self.stroke = None;
        self.css_size = css_size;
        let (width, height) = pad_backing(css_size, self.dpr);
        self.pad.resize(width, height);
        self.ink.resize(width, height);
        if let Some(image) = saved {
            if let Err(e) = self.ink.draw_image(image) {
                warn!(error = %e, "signature: saved signature failed to draw; starting blank");
                self.ink.clear();
            }
        }
        self.repaint_or_warn();
        self.history.reset();
        self.capture_initial(now_ms);
        debug!(width, height, loaded = saved.is_some(), "signature: pad opened");
        vec![self.history_changed(), Action::RenderNeeded]
    }

    // --- Input events ---

    /// Start a line at `css`. A second pointer is ignored.
    pub fn on_pointer_down(&mut self, css: Point, pointer_id: Option<i32>) -> Vec<Action> {
        if self.stroke.is_some() {
            debug!(?pointer_id, "signature: second pointer ignored");
            return Vec::new();
        }
        let Some(start) = self.to_backing(css) else {
            return Vec::new();
        };
        self.stroke = Some(PadStroke { last: start, pointer_id, drawn: false });
        pointer_id.map(Action::CapturePointer).into_iter().collect()
    }

    pub fn on_pointer_move(&mut self, css: Point) -> Vec<Action> {
        let (Some(mut stroke), Some(p)) = (self.stroke, self.to_backing(css)) else {
            return Vec::new();
        };
        let segment = Path::segment(stroke.last, p);
        let pen = Pen::solid(INK_COLOR, INK_WIDTH_CSS * self.dpr);
        if let Err(e) = self.ink.stroke(&segment, &pen).and_then(|()| self.pad.stroke(&segment, &pen)) {
            warn!(error = %e, "signature: segment failed");
            return Vec::new();
        }
        stroke.last = p;
        stroke.drawn = true;
        self.stroke = Some(stroke);
        vec![Action::RenderNeeded]
    }

    /// Finish the line. Also the handler for pointer leave and cancel.
    pub fn on_pointer_up(&mut self, now_ms: f64) -> Vec<Action> {
        let Some(stroke) = self.stroke.take() else {
            return Vec::new();
        };
        let mut actions: Vec<Action> = stroke.pointer_id.map(Action::ReleasePointer).into_iter().collect();
        if stroke.drawn {
            match self.ink.snapshot() {
                Ok(state) => {
                    self.history.capture(state, now_ms);
                }
                Err(e) => warn!(error = %e, "signature: snapshot failed; line not undoable"),
            }
            actions.push(self.history_changed());
        }
        actions
    }

    // --- History ---

    /// Drive the history debounce.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        if self.history.poll(now_ms) {
            vec![self.history_changed()]
        } else {
            Vec::new()
        }
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.stroke = None;
        let state = self.history.undo().map(|entry| entry.state.clone());
        self.restore(state.as_ref(), "undo")
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.stroke = None;
        let state = self.history.redo().map(|entry| entry.state.clone());
        self.restore(state.as_ref(), "redo")
    }

    fn restore(&mut self, state: Option<&RasterSnapshot>, what: &'static str) -> Vec<Action> {
        if let Some(state) = state {
            if let Err(e) = self.ink.restore(state) {
                warn!(error = %e, what, "signature: restore failed");
            }
            self.repaint_or_warn();
        }
        vec![self.history_changed(), Action::RenderNeeded]
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStack<RasterSnapshot> {
        &self.history
    }

    fn capture_initial(&mut self, now_ms: f64) {
        match self.ink.snapshot() {
            Ok(state) => self.history.capture_now(state, now_ms),
            Err(e) => warn!(error = %e, "signature: initial snapshot failed; undo unavailable"),
        }
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }

    // --- Queries ---

    /// Whether anything has been signed. Scans every pixel of the ink layer.
    ///
    /// # Errors
    ///
    /// Fails if the pixel scan fails.
    pub fn is_drawn(&self) -> Result<bool, LayerError> {
        self.ink.has_ink()
    }

    #[must_use]
    pub fn pad(&self) -> &L {
        &self.pad
    }

    #[must_use]
    pub fn ink(&self) -> &L {
        &self.ink
    }

    #[must_use]
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    // --- Persistence ---

    /// Store the signature, or remove the stored one if the pad is blank.
    pub async fn save<S>(&mut self, store: &S) -> SignatureStatus
    where
        S: KeyValueStore + ?Sized,
    {
        self.history.flush_pending();
        let drawn = self.is_drawn().unwrap_or_else(|e| {
            warn!(error = %e, "signature: blank check failed; saving anyway");
            true
        });
        if !drawn {
            store::remove_logged(store, SIGNATURE_KEY).await;
            info!("signature: pad blank; stored signature removed");
            return SignatureStatus::Blank;
        }
        let url = match self.pad.encode() {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "signature: encode failed");
                return SignatureStatus::Failed;
            }
        };
        match store.set(SIGNATURE_KEY, url).await {
            Ok(()) => {
                info!("signature: saved");
                SignatureStatus::Signed
            }
            Err(e) => {
                warn!(error = %e, "signature: store write failed");
                SignatureStatus::Failed
            }
        }
    }

    /// Wipe the pad, forget its history and drop the stored signature.
    pub async fn clear<S>(&mut self, store: &S, now_ms: f64) -> Vec<Action>
    where
        S: KeyValueStore + ?Sized,
    {
        self.stroke = None;
        self.ink.clear();
        self.repaint_or_warn();
        self.history.reset();
        self.capture_initial(now_ms);
        store::remove_logged(store, SIGNATURE_KEY).await;
        vec![self.history_changed(), Action::RenderNeeded]
    }

    /// The stored signature data URL, if any. Read failures yield `None`.
    pub async fn fetch_saved<S>(store: &S) -> Option<String>
    where
        S: KeyValueStore + ?Sized,
    {
        match store.get(SIGNATURE_KEY).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "signature: read failed; starting blank");
                None
            }
        }
    }

    // --- Painting ---

    fn to_backing(&self, css: Point) -> Option<Point> {
        let backing = self.pad.size();
        if self.css_size.is_empty() || backing.is_empty() {
            return None;
        }
        Some(clamp_extended(to_backing_pixels(css, self.css_size, backing), backing, self.margin))
    }

    fn repaint(&mut self) -> Result<(), LayerError> {
        let size = self.pad.size();
        let mut page = Path::new();
        page.rect(Point::new(0.0, 0.0), size.width, size.height);
        self.pad.clear();
        self.pad.fill(&page, PAD_FILL)?;
        self.pad.draw_layer(&self.ink, 1.0)
    }

    fn repaint_or_warn(&mut self) {
        if let Err(e) = self.repaint() {
            warn!(error = %e, "signature: pad repaint failed");
        }
    }
}

/// Backing size for a pad box: CSS size times the pixel ratio (never below
/// one), floored, at least [`MIN_PAD_PX`] per side.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn pad_backing(css: Size, dpr: f64) -> (u32, u32) {
    let scale = dpr.max(1.0);
    let dim = |v: f64| (v * scale).floor().max(f64::from(MIN_PAD_PX)).min(f64::from(u32::MAX)) as u32;
    (dim(css.width), dim(css.height))
}

/// The browser signature pad bound to one canvas.
pub struct SignaturePad {
    canvas: HtmlCanvasElement,
    pub core: SignatureCore<CanvasLayer>,
}

impl SignaturePad {
    /// # Errors
    ///
    /// Fails if the canvas has no 2D context or `config` is out of range.
    pub fn new(canvas: HtmlCanvasElement, dpr: f64, config: &EditorConfig) -> Result<Self, EditorError> {
        let core = SignatureCore::new(CanvasLayer::new(canvas.clone())?, dpr, config)?;
        Ok(Self { canvas, core })
    }

    /// Open the pad once the saved signature (if any) has decoded.
    pub async fn open(&mut self, saved: Option<HtmlImageElement>, css_size: Size, now_ms: f64) -> Vec<Action> {
        let saved = decoded(saved).await;
        self.core.open(saved.as_ref(), css_size, now_ms)
    }

    fn local(&self, client: Point) -> Point {
        let rect = self.canvas.get_bounding_client_rect();
        css_from_client(client, rect.left(), rect.top())
    }

    pub fn on_pointer_down(&mut self, client: Point, pointer_id: i32) -> Vec<Action> {
        let actions = self.core.on_pointer_down(self.local(client), Some(pointer_id));
        apply_pointer_actions(&self.canvas, actions)
    }

    pub fn on_pointer_move(&mut self, client: Point) -> Vec<Action> {
        self.core.on_pointer_move(self.local(client))
    }

    pub fn on_pointer_up(&mut self, now_ms: f64) -> Vec<Action> {
        let actions = self.core.on_pointer_up(now_ms);
        apply_pointer_actions(&self.canvas, actions)
    }
}
