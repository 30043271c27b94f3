use store::KeyValueStore;
use tracing::{debug, info, warn};
use wasm_bindgen::JsValue;
use web_sys::{HtmlCanvasElement, HtmlImageElement};

use crate::config::{ConfigError, EditorConfig};
use crate::coords::{Point, Size, css_from_client};
use crate::history::HistoryStack;
use crate::layer::{Layer, LayerError};
use crate::record::{AnnotationRecord, ExportBundle, RecordError};
use crate::render::CanvasLayer;
use crate::shape::Color;
use crate::surface::{Brush, DrawingSurface, InkState, LayerStack};
use crate::text::{TextBox, TextDrag, TextId, TextRelease};
use crate::tool::{Gesture, Tool, ToolChange, ToolContext, ToolController};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Call `setPointerCapture`; failure is harmless.
    CapturePointer(i32),
    ReleasePointer(i32),
    RenderNeeded,
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// Focus the DOM element of a text box for typing.
    EditTextRequested { id: TextId },
    /// Text boxes were added, moved or removed; re-lay out the overlay.
    TextBoxesChanged,
    SetCursor(&'static str),
    /// CSS opacity of the preview canvas.
    SetPreviewOpacity(f64),
}

/// Result of [`EditorCore::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    /// The write was lost. `notify` is set only for the first failure of the
    /// session so the host warns the user once.
    Failed { notify: bool },
}

/// Editing session state: all logic that doesn't depend on the browser.
///
/// One instance per open target. [`EditorCore::open`] resets everything, so
/// nothing leaks from the previously edited photo.
pub struct EditorCore<L: Layer> {
    surface: DrawingSurface<L>,
    history: HistoryStack<InkState>,
    tools: ToolController,
    gesture: Gesture,
    config: EditorConfig,
    notes: String,
    base_url: Option<String>,
    save_failure_reported: bool,
    /// Latest clock reading seen; text edits arrive without one.
    clock_ms: f64,
}

impl<L: Layer> EditorCore<L> {
    /// # Errors
    ///
    /// Fails if `config` is out of range or the surface cannot create its
    /// offscreen layer.
    pub fn new(layers: LayerStack<L>, dpr: f64, config: EditorConfig) -> Result<Self, EditorError> {
        config.validate()?;
        let mut surface = DrawingSurface::new(layers, dpr)?;
        surface.configure(config.extend_margin_px, config.highlight_alpha);
        Ok(Self {
            surface,
            history: HistoryStack::new(config.history_cap, config.history_debounce_ms),
            tools: ToolController::new(ToolContext::Editor, config.tools.clone()),
            gesture: Gesture::Idle,
            config,
            notes: String::new(),
            base_url: None,
            save_failure_reported: false,
            clock_ms: 0.0,
        })
    }

    // --- Session ---

    /// Start editing a target. Surface, history, tools and gesture are reset
    /// before anything of the new target is loaded; the loaded state becomes
    /// the first history entry.
    pub fn open(
        &mut self,
        base: Option<&L::Image>,
        ink: Option<&L::Image>,
        record: Option<&AnnotationRecord>,
        css_size: Size,
        now_ms: f64,
    ) -> Vec<Action> {
        self.gesture = Gesture::Idle;
        self.surface.reset();
        self.history.reset();
        self.tools.reset();
        self.notes.clear();
        self.base_url = None;

        self.surface.load_base(base);
        self.surface.set_css_size(css_size);
        if let Some(ink) = ink {
            self.surface.load_ink(ink);
        }
        if let Some(record) = record {
            self.surface.load_shapes(record.shapes.clone());
            self.load_texts(record);
            self.notes.clone_from(&record.notes);
            self.base_url.clone_from(&record.base_url);
        }
        self.capture_initial(now_ms);
        debug!(
            shapes = self.surface.shapes().len(),
            texts = self.surface.texts().len(),
            "editor: opened target"
        );

        vec![
            Action::SetCursor(cursor_for(self.tools.active())),
            Action::SetPreviewOpacity(1.0),
            self.history_changed(),
            Action::TextBoxesChanged,
            Action::RenderNeeded,
        ]
    }

    fn load_texts(&mut self, record: &AnnotationRecord) {
        let (css, backing) = (self.surface.css_size(), self.surface.size());
        if css.is_empty() || backing.is_empty() {
            if !record.texts.is_empty() {
                warn!(count = record.texts.len(), "editor: no layout size; saved text boxes skipped");
            }
            return;
        }
        self.surface.texts_mut().load_records(&record.texts, css, backing);
    }

    fn capture_initial(&mut self, now_ms: f64) {
        self.clock_ms = now_ms;
        match self.surface.snapshot() {
            Ok(state) => self.history.capture_now(state, now_ms),
            Err(e) => warn!(error = %e, "editor: initial snapshot failed; undo unavailable"),
        }
    }

    /// Displayed size changed (window resize or rotation).
    pub fn set_css_size(&mut self, css_size: Size) {
        self.surface.set_css_size(css_size);
    }

    // --- Tools ---

    /// Switch tools. An unfinished gesture is dropped and the eraser ring hidden.
    pub fn select_tool(&mut self, tool: Tool) -> Vec<Action> {
        let change = self.tools.select(tool);
        if !change.changed() {
            return Vec::new();
        }
        let mut actions = self.abort_gesture();
        self.surface.hide_eraser_cursor();
        if let ToolChange::Switched { to, .. } = change {
            actions.push(Action::SetCursor(cursor_for(to)));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    #[must_use]
    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    /// Size, colour and shape options of the tools.
    pub fn tools_mut(&mut self) -> &mut ToolController {
        &mut self.tools
    }

    fn brush_for(&self, tool: Tool) -> Option<Brush> {
        match tool {
            Tool::Pen => {
                let s = self.tools.pen_settings();
                Some(Brush::Pen { color: s.color.clone(), size: s.size })
            }
            Tool::Highlighter => {
                let s = self.tools.highlighter_settings();
                Some(Brush::Highlighter { color: s.color.clone(), size: s.size })
            }
            Tool::Eraser => Some(Brush::Eraser { size: self.tools.eraser_size() }),
            Tool::Shape => Some(Brush::Shape { kind: self.tools.shape_kind(), style: self.tools.shape_style() }),
            Tool::Pan | Tool::Text | Tool::Pin => None,
        }
    }

    // --- Input events ---

    /// Pointer pressed at `css` (relative to the layer stack). The pointer is
    /// captured only for tools that drag.
    pub fn on_pointer_down(&mut self, css: Point, pointer_id: Option<i32>) -> Vec<Action> {
        if !self.gesture.is_idle() {
            debug!(?pointer_id, "editor: second pointer ignored");
            return Vec::new();
        }
        let tool = self.tools.active();
        let pointer_id = pointer_id.filter(|_| tool.captures_pointer());
        if tool == Tool::Text {
            return self.text_down(css, pointer_id);
        }
        let (Some(brush), Some(backing)) = (self.brush_for(tool), self.surface.to_backing(css)) else {
            return Vec::new();
        };
        self.surface.begin_stroke(brush, backing);
        self.gesture = Gesture::Drawing { tool, pointer_id };

        let mut actions = Vec::new();
        if let Some(id) = pointer_id {
            actions.push(Action::CapturePointer(id));
        }
        match tool {
            Tool::Highlighter => actions.push(Action::SetPreviewOpacity(self.config.highlight_alpha)),
            Tool::Eraser => {
                if self.erase(backing) {
                    actions.push(Action::TextBoxesChanged);
                }
            }
            _ => {}
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_move(&mut self, css: Point) -> Vec<Action> {
        match &mut self.gesture {
            Gesture::Idle => {
                if self.tools.active() != Tool::Eraser {
                    return Vec::new();
                }
                let Some(backing) = self.surface.to_backing(css) else {
                    return Vec::new();
                };
                self.show_ring(backing);
                vec![Action::RenderNeeded]
            }
            Gesture::Text { id, drag, .. } => {
                let id = *id;
                let Some(text_box) = self.surface.texts().get(&id) else {
                    return Vec::new();
                };
                let box_size = Size::new(text_box.width, text_box.height);
                let Some(origin) = drag.update(css, box_size, self.surface.css_size()) else {
                    return Vec::new();
                };
                self.surface.texts_mut().move_to(&id, origin);
                vec![Action::TextBoxesChanged]
            }
            Gesture::Drawing { tool, .. } => {
                let tool = *tool;
                let Some(backing) = self.surface.to_backing(css) else {
                    return Vec::new();
                };
                if let Err(e) = self.surface.extend_stroke(backing) {
                    warn!(error = %e, ?tool, "editor: stroke segment failed");
                }
                let mut actions = Vec::new();
                if tool == Tool::Eraser && self.erase(backing) {
                    actions.push(Action::TextBoxesChanged);
                }
                actions.push(Action::RenderNeeded);
                actions
            }
        }
    }

    pub fn on_pointer_up(&mut self, css: Point, now_ms: f64) -> Vec<Action> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Vec::new(),
            Gesture::Text { id, drag, pointer_id } => self.text_up(id, drag, pointer_id),
            Gesture::Drawing { tool, pointer_id } => {
                let mut actions = Vec::new();
                if let Some(id) = pointer_id {
                    actions.push(Action::ReleasePointer(id));
                }
                if tool == Tool::Highlighter {
                    actions.push(Action::SetPreviewOpacity(1.0));
                }
                match self.surface.commit_stroke() {
                    Ok(outcome) if outcome.changed() => {
                        self.capture(now_ms);
                        actions.push(self.history_changed());
                    }
                    Ok(outcome) => debug!(?tool, ?outcome, "editor: stroke left no change"),
                    Err(e) => warn!(error = %e, ?tool, "editor: stroke commit failed"),
                }
                if tool == Tool::Eraser {
                    if let Some(backing) = self.surface.to_backing(css) {
                        self.show_ring(backing);
                    }
                }
                actions.push(Action::RenderNeeded);
                actions
            }
        }
    }

    /// Pointer left the layer stack. Hides the eraser ring; a captured
    /// stroke keeps going.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        if !self.surface.eraser_cursor_visible() || !self.gesture.is_idle() {
            return Vec::new();
        }
        self.surface.hide_eraser_cursor();
        vec![Action::RenderNeeded]
    }

    /// The browser cancelled the pointer (e.g. a system gesture took over).
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        self.abort_gesture()
    }

    pub fn on_key_down(&mut self, key: &str) -> Vec<Action> {
        match key {
            "Escape" => self.abort_gesture(),
            _ => Vec::new(),
        }
    }

    /// Drop the current gesture without committing it.
    fn abort_gesture(&mut self) -> Vec<Action> {
        let gesture = std::mem::take(&mut self.gesture);
        if gesture.is_idle() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if let Some(id) = gesture.captured_pointer() {
            actions.push(Action::ReleasePointer(id));
        }
        if self.surface.cancel_stroke() {
            actions.push(Action::SetPreviewOpacity(1.0));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Eraser ---

    /// Remove shapes and text boxes under the eraser. Returns whether text
    /// boxes went away.
    fn erase(&mut self, backing: Point) -> bool {
        let size = self.tools.eraser_size();
        let removed_texts = match self.surface.erase_at(backing, size) {
            Ok(erased) => !erased.texts.is_empty(),
            Err(e) => {
                warn!(error = %e, "editor: eraser hit-test redraw failed");
                false
            }
        };
        self.show_ring(backing);
        removed_texts
    }

    fn show_ring(&mut self, backing: Point) {
        let size = self.tools.eraser_size();
        if let Err(e) = self.surface.show_eraser_cursor(backing, size) {
            debug!(error = %e, "editor: eraser ring draw failed");
        }
    }

    // --- Text ---

    fn text_down(&mut self, css: Point, pointer_id: Option<i32>) -> Vec<Action> {
        if let Some(hit) = self.surface.texts().box_at(css) {
            let drag = TextDrag::begin(css, hit.origin());
            self.gesture = Gesture::Text { id: hit.id, drag, pointer_id };
            return pointer_id.map(Action::CapturePointer).into_iter().collect();
        }
        let css_size = self.surface.css_size();
        if css_size.is_empty() {
            return Vec::new();
        }
        let text_box = TextBox::place(css, css_size, self.tools.text_background().clone());
        let id = self.surface.texts_mut().add(text_box);
        self.capture_text_change();
        vec![Action::TextBoxesChanged, Action::EditTextRequested { id }]
    }

    fn text_up(&mut self, id: TextId, drag: TextDrag, pointer_id: Option<i32>) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(pointer) = pointer_id {
            actions.push(Action::ReleasePointer(pointer));
        }
        match drag.finish() {
            TextRelease::Click => actions.push(Action::EditTextRequested { id }),
            TextRelease::Drag => {
                self.capture_text_change();
                actions.push(Action::TextBoxesChanged);
            }
        }
        actions
    }

    /// Commit text typed into a box and its measured height (CSS px).
    pub fn set_text(&mut self, id: &TextId, text: String, measured_height: f64) -> bool {
        let changed = self.surface.texts_mut().set_text(id, text, measured_height);
        if changed {
            self.capture_text_change();
        }
        changed
    }

    pub fn set_text_background(&mut self, id: &TextId, color: Color) -> bool {
        let changed = self.surface.texts_mut().set_background(id, color);
        if changed {
            self.capture_text_change();
        }
        changed
    }

    pub fn delete_text(&mut self, id: &TextId) -> Vec<Action> {
        if self.surface.texts_mut().remove(id) {
            self.capture_text_change();
            vec![Action::TextBoxesChanged]
        } else {
            Vec::new()
        }
    }

    /// Text boxes are part of undoable content; typing bursts merge through
    /// the debounce like strokes do.
    fn capture_text_change(&mut self) {
        self.capture(self.clock_ms);
    }

    // --- History ---

    fn capture(&mut self, now_ms: f64) {
        self.clock_ms = self.clock_ms.max(now_ms);
        match self.surface.snapshot() {
            Ok(state) => {
                self.history.capture(state, now_ms);
            }
            Err(e) => warn!(error = %e, "editor: snapshot failed; change not undoable"),
        }
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }

    /// Drive the history debounce; call from an animation frame or timer.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.clock_ms = self.clock_ms.max(now_ms);
        if self.history.poll(now_ms) {
            vec![self.history_changed()]
        } else {
            Vec::new()
        }
    }

    pub fn undo(&mut self) -> Vec<Action> {
        let mut actions = self.abort_gesture();
        if let Some(entry) = self.history.undo() {
            if let Err(e) = self.surface.restore(&entry.state) {
                warn!(error = %e, "editor: undo restore failed");
            }
        }
        actions.push(self.history_changed());
        actions.push(Action::TextBoxesChanged);
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let mut actions = self.abort_gesture();
        if let Some(entry) = self.history.redo() {
            if let Err(e) = self.surface.restore(&entry.state) {
                warn!(error = %e, "editor: redo restore failed");
            }
        }
        actions.push(self.history_changed());
        actions.push(Action::TextBoxesChanged);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Wipe freehand ink and shapes and start history over. Text boxes stay.
    pub fn clear_all(&mut self, now_ms: f64) -> Vec<Action> {
        let mut actions = self.abort_gesture();
        self.surface.clear_ink();
        self.history.reset();
        self.capture_initial(now_ms);
        actions.push(self.history_changed());
        actions.push(Action::RenderNeeded);
        actions
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStack<InkState> {
        &self.history
    }

    // --- Queries ---

    #[must_use]
    pub fn surface(&self) -> &DrawingSurface<L> {
        &self.surface
    }

    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: String) {
        self.notes = notes;
    }

    // --- Save / export ---

    /// The record to persist for this target.
    #[must_use]
    pub fn save(&self) -> AnnotationRecord {
        let ink_url = match self.surface.stroke_layer().has_ink() {
            Ok(false) => None,
            Ok(true) => self.encoded("ink", self.surface.encode_ink()),
            Err(e) => {
                warn!(error = %e, "editor: ink scan failed; saving ink anyway");
                self.encoded("ink", self.surface.encode_ink())
            }
        };
        let (css, backing) = (self.surface.css_size(), self.surface.size());
        let texts = if css.is_empty() || backing.is_empty() {
            Vec::new()
        } else {
            self.surface.texts().to_records(css, backing)
        };
        AnnotationRecord {
            ink_url,
            base_url: self.base_url.clone(),
            composed_url: self.encoded("composite", self.surface.encode_composite()),
            shapes: self.surface.shapes().to_vec(),
            texts,
            notes: self.notes.clone(),
            ..AnnotationRecord::default()
        }
    }

    fn encoded(&self, what: &'static str, result: Result<String, LayerError>) -> Option<String> {
        match result {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, what, dpr = self.surface.dpr(), "editor: encode failed");
                None
            }
        }
    }

    /// Flattened image and raw parts for the report generator.
    ///
    /// # Errors
    ///
    /// Fails if either raster cannot be encoded.
    pub fn export(&self) -> Result<ExportBundle, RecordError> {
        let (css, backing) = (self.surface.css_size(), self.surface.size());
        let texts = if css.is_empty() || backing.is_empty() {
            Vec::new()
        } else {
            self.surface.texts().to_records(css, backing)
        };
        Ok(ExportBundle {
            composited: self.surface.encode_composite()?,
            ink: self.surface.encode_ink()?,
            shapes: self.surface.shapes().to_vec(),
            texts,
            width: backing.width,
            height: backing.height,
        })
    }

    /// Write [`EditorCore::save`] under `key`. In-memory state is kept
    /// whether or not the write lands.
    pub async fn persist<S>(&mut self, store: &S, key: &str) -> SaveStatus
    where
        S: KeyValueStore + ?Sized,
    {
        self.history.flush_pending();
        let record = self.save();
        if store::write_json(store, key, &record).await {
            info!(key, shapes = record.shapes.len(), texts = record.texts.len(), "editor: saved");
            return SaveStatus::Saved;
        }
        let notify = !self.save_failure_reported;
        self.save_failure_reported = true;
        SaveStatus::Failed { notify }
    }

    /// Read a saved record; missing or unreadable data yields `None`.
    pub async fn fetch_record<S>(store: &S, key: &str) -> Option<AnnotationRecord>
    where
        S: KeyValueStore + ?Sized,
    {
        store::read_json(store, key, None).await
    }
}

fn cursor_for(tool: Tool) -> &'static str {
    match tool {
        Tool::Pen | Tool::Highlighter | Tool::Shape => "crosshair",
        Tool::Eraser => "none",
        Tool::Text => "text",
        Tool::Pan => "grab",
        Tool::Pin => "copy",
    }
}

/// The browser editor. Wraps [`EditorCore`] and owns the four stacked canvases.
pub struct Editor {
    ink_canvas: HtmlCanvasElement,
    pub core: EditorCore<CanvasLayer>,
}

impl Editor {
    /// Bind to the base, preview, ink and overlay canvases, bottom to top.
    ///
    /// # Errors
    ///
    /// Fails if a canvas has no 2D context or `config` is out of range.
    pub fn new(
        canvases: [HtmlCanvasElement; 4],
        dpr: f64,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let [base, preview, ink, overlay] = canvases;
        let ink_canvas = ink.clone();
        let layers = LayerStack {
            base: CanvasLayer::new(base)?,
            preview: CanvasLayer::new(preview)?,
            ink: CanvasLayer::new(ink)?,
            overlay: CanvasLayer::new(overlay)?,
        };
        Ok(Self { ink_canvas, core: EditorCore::new(layers, dpr, config)? })
    }

    /// Open a target once its images have decoded. Images that fail to decode
    /// are treated as missing.
    pub async fn open(
        &mut self,
        base: Option<HtmlImageElement>,
        ink: Option<HtmlImageElement>,
        record: Option<&AnnotationRecord>,
        css_size: Size,
        now_ms: f64,
    ) -> Vec<Action> {
        let base = decoded(base).await;
        let ink = decoded(ink).await;
        self.core.open(base.as_ref(), ink.as_ref(), record, css_size, now_ms)
    }

    /// Carry out the pointer-capture actions on the ink canvas and hand the
    /// rest back to the host.
    pub fn apply(&self, actions: Vec<Action>) -> Vec<Action> {
        apply_pointer_actions(&self.ink_canvas, actions)
    }

    /// Map a pointer event's client position onto the layer stack.
    fn local(&self, client: Point) -> Point {
        let rect = self.ink_canvas.get_bounding_client_rect();
        css_from_client(client, rect.left(), rect.top())
    }

    pub fn on_pointer_down(&mut self, client: Point, pointer_id: i32) -> Vec<Action> {
        let actions = self.core.on_pointer_down(self.local(client), Some(pointer_id));
        self.apply(actions)
    }

    pub fn on_pointer_move(&mut self, client: Point) -> Vec<Action> {
        self.core.on_pointer_move(self.local(client))
    }

    pub fn on_pointer_up(&mut self, client: Point, now_ms: f64) -> Vec<Action> {
        let actions = self.core.on_pointer_up(self.local(client), now_ms);
        self.apply(actions)
    }

    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        let actions = self.core.on_pointer_cancel();
        self.apply(actions)
    }

    pub fn on_key_down(&mut self, key: &str) -> Vec<Action> {
        let actions = self.core.on_key_down(key);
        self.apply(actions)
    }
}

/// Run capture and release on `canvas`; every other action is returned.
pub(crate) fn apply_pointer_actions(canvas: &HtmlCanvasElement, actions: Vec<Action>) -> Vec<Action> {
    actions
        .into_iter()
        .filter(|action| match action {
            Action::CapturePointer(id) => {
                pointer_call(canvas, *id, canvas.set_pointer_capture(*id));
                false
            }
            Action::ReleasePointer(id) => {
                pointer_call(canvas, *id, canvas.release_pointer_capture(*id));
                false
            }
            _ => true,
        })
        .collect()
}

fn pointer_call(canvas: &HtmlCanvasElement, pointer_id: i32, result: Result<(), JsValue>) {
    if let Err(e) = result {
        debug!(pointer_id, error = ?e, canvas = %canvas.id(), "pointer capture call failed");
    }
}

/// Wait for an image to decode. Images that fail are treated as missing.
pub(crate) async fn decoded(image: Option<HtmlImageElement>) -> Option<HtmlImageElement> {
    let image = image?;
    match wasm_bindgen_futures::JsFuture::from(image.decode()).await {
        Ok(_) => Some(image),
        Err(e) => {
            warn!(error = ?e, src = %image.src(), "editor: image failed to decode");
            None
        }
    }
}
