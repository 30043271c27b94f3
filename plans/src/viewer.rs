//! Floor-plan viewer session.
//!
//! Owns the camera, the pins of the open report and the link state for one
//! viewer. Handlers take CSS-pixel positions relative to the plan canvas and
//! return [`ViewerAction`]s; the host redraws the plan and the SVG pin layer
//! from [`FloorPlanViewer::glyphs`].

#[cfg(test)]
#[path = "viewer_test.rs"]
mod viewer_test;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};
use uuid::Uuid;

use canvas::coords::{Point, Size};
use canvas::tool::{Tool, ToolContext, ToolController, ToolDefaults};

use crate::camera::PlanCamera;
use crate::config::{ConfigError, ViewerConfig};
use crate::link::{PinLinkController, Selection};
use crate::model::{FloorPlanCard, Pin, PinId, Plan};
use crate::palette::PinPalette;
use crate::pins::{NewPin, PinBook};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    RenderNeeded,
    /// The pin set changed and should be persisted.
    PinsChanged,
    /// Show the detail popover for `pin`, anchored at its screen position.
    PopoverOpened { pin: PinId, anchor: Point },
    PopoverClosed,
    /// Link mode toggled or the set of linked cards changed.
    TrayHighlightChanged { link_mode: bool },
    SetCursor(&'static str),
    PlanChanged { index: usize, count: usize },
}

/// One pin as the SVG layer draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct PinGlyph {
    pub id: PinId,
    pub screen: Point,
    pub head_color: String,
    pub linked: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Point,
    last: Point,
    dragging: bool,
}

pub struct FloorPlanViewer {
    report_id: String,
    card: Option<FloorPlanCard>,
    plan_index: usize,
    camera: PlanCamera,
    viewport: Size,
    tools: ToolController,
    book: PinBook,
    palette: PinPalette,
    link: PinLinkController,
    press: Option<Press>,
    rng: StdRng,
    config: ViewerConfig,
}

impl FloorPlanViewer {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is out of range.
    pub fn new(report_id: impl Into<String>, config: ViewerConfig) -> Result<Self, ConfigError> {
        Self::with_seed(report_id, config, Uuid::new_v4().as_u64_pair().0)
    }

    /// A viewer whose colour picks are reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is out of range.
    pub fn with_seed(report_id: impl Into<String>, config: ViewerConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            report_id: report_id.into(),
            card: None,
            plan_index: 0,
            camera: PlanCamera::default(),
            viewport: Size::default(),
            tools: ToolController::new(ToolContext::FloorPlan, ToolDefaults::default()),
            book: PinBook::new(),
            palette: PinPalette::new(),
            link: PinLinkController::new(),
            press: None,
            rng: StdRng::seed_from_u64(seed),
            config,
        })
    }

    /// Replace the report's pins, e.g. after loading them from storage.
    pub fn load_pins(&mut self, pins: Vec<Pin>) -> Vec<ViewerAction> {
        self.link.cancel();
        self.palette.seed_from_pins(&pins);
        self.book = PinBook::from_pins(pins);
        vec![ViewerAction::RenderNeeded]
    }

    /// Show a floor-plan card, starting at its first plan with the pan tool.
    pub fn open_card(&mut self, card: FloorPlanCard, viewport: Size) -> Vec<ViewerAction> {
        let mut out = Vec::new();
        self.cancel_link(&mut out);
        self.press = None;
        self.tools.reset();
        self.viewport = viewport;
        self.plan_index = 0;
        info!(card = %card.id, plans = card.plans.len(), "viewer: opened floor-plan card");
        self.card = Some(card);
        self.fit();
        out.push(ViewerAction::SetCursor(cursor_for(self.tools.active())));
        out.push(self.plan_changed());
        out.push(ViewerAction::RenderNeeded);
        out
    }

    /// The viewer was closed; drop the card but keep the pins.
    pub fn close(&mut self) -> Vec<ViewerAction> {
        let mut out = Vec::new();
        self.cancel_link(&mut out);
        self.press = None;
        self.card = None;
        self.plan_index = 0;
        out
    }

    /// The canvas was resized; refit the current plan.
    pub fn resize(&mut self, viewport: Size) -> Vec<ViewerAction> {
        self.viewport = viewport;
        self.fit();
        vec![ViewerAction::RenderNeeded]
    }

    fn fit(&mut self) {
        self.camera = match self.current_plan() {
            Some(plan) => PlanCamera::fit(self.viewport, plan.size(), self.config.fit_upscale),
            None => PlanCamera::default(),
        };
    }

    // --- Tools ---

    pub fn select_tool(&mut self, tool: Tool) -> Vec<ViewerAction> {
        let change = self.tools.select(tool);
        if !change.changed() {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.press = None;
        self.cancel_link(&mut out);
        debug!(?change, "viewer: tool changed");
        out.push(ViewerAction::SetCursor(cursor_for(self.tools.active())));
        out
    }

    #[must_use]
    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    // --- Pointer ---

    /// Pan and eraser drag at once; the pin tool waits for the drag threshold.
    pub fn on_pointer_down(&mut self, screen: Point) -> Vec<ViewerAction> {
        let tool = self.tools.active();
        let dragging = matches!(tool, Tool::Pan | Tool::Eraser);
        self.press = Some(Press { origin: screen, last: screen, dragging });
        let mut out = Vec::new();
        if dragging {
            self.cancel_link(&mut out);
            if tool == Tool::Pan {
                out.push(ViewerAction::SetCursor("grabbing"));
            }
        }
        out
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<ViewerAction> {
        let Some(mut press) = self.press else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if !press.dragging && press.origin.distance(screen) > self.config.pin_drag_threshold_px {
            press.dragging = true;
            self.cancel_link(&mut out);
            out.push(ViewerAction::SetCursor("grabbing"));
        }
        if press.dragging {
            self.camera.pan_by(screen.x - press.last.x, screen.y - press.last.y);
            press.last = screen;
            out.push(ViewerAction::RenderNeeded);
        }
        self.press = Some(press);
        out
    }

    /// End a press. A pin-tool click places a pin; a click with another
    /// tool cancels any pending link.
    pub fn on_pointer_up(&mut self, screen: Point, now_ms: f64) -> Vec<ViewerAction> {
        let Some(press) = self.press.take() else {
            return Vec::new();
        };
        let tool = self.tools.active();
        let mut out = vec![ViewerAction::SetCursor(cursor_for(tool))];
        if tool == Tool::Pin && !press.dragging {
            self.cancel_link(&mut out);
            self.place_pin_at(screen, now_ms, &mut out);
            return out;
        }
        self.cancel_link(&mut out);
        out
    }

    /// Pointer left the canvas or was cancelled by the platform.
    pub fn on_pointer_cancel(&mut self) -> Vec<ViewerAction> {
        if self.press.take().is_none() {
            return Vec::new();
        }
        vec![ViewerAction::SetCursor(cursor_for(self.tools.active()))]
    }

    /// Zoom one wheel notch about the cursor.
    pub fn on_wheel(&mut self, screen: Point, delta_y: f64) -> Vec<ViewerAction> {
        let mut out = Vec::new();
        self.cancel_link(&mut out);
        if self.camera.zoom_at(screen, delta_y, &self.config) {
            out.push(ViewerAction::RenderNeeded);
        }
        out
    }

    fn place_pin_at(&mut self, screen: Point, now_ms: f64, out: &mut Vec<ViewerAction>) {
        let Some(plan) = self.current_plan() else {
            return;
        };
        let Some(position) = self.camera.screen_to_plan(screen, plan.size()) else {
            debug!(x = screen.x, y = screen.y, "viewer: click outside the plan");
            return;
        };
        let new = NewPin {
            report_id: self.report_id.clone(),
            card_id: plan.card_id,
            plan_id: plan.id,
            position,
        };
        match self.link.place_pin(&mut self.book, &mut self.palette, &mut self.rng, new, now_ms) {
            Ok(pin) => {
                out.push(ViewerAction::PinsChanged);
                out.push(ViewerAction::RenderNeeded);
                out.push(ViewerAction::TrayHighlightChanged { link_mode: true });
                if let Some(anchor) = self.pin_anchor(pin) {
                    out.push(ViewerAction::PopoverOpened { pin, anchor });
                }
            }
            Err(err) => debug!(%err, "viewer: pin not placed"),
        }
    }

    // --- Pins ---

    /// A pin in the SVG layer was clicked. The eraser deletes it; other
    /// tools toggle its selection.
    pub fn on_pin_click(&mut self, pin: PinId) -> Vec<ViewerAction> {
        if self.tools.active() == Tool::Eraser {
            return self.delete_pin(pin);
        }
        if self.book.get(&pin).is_none() {
            debug!(%pin, "viewer: click on unknown pin");
            return Vec::new();
        }
        match self.link.select_pin(pin) {
            Selection::Closed => vec![
                ViewerAction::PopoverClosed,
                ViewerAction::TrayHighlightChanged { link_mode: false },
                ViewerAction::RenderNeeded,
            ],
            Selection::Opened(pin) => {
                let mut out = vec![
                    ViewerAction::TrayHighlightChanged { link_mode: true },
                    ViewerAction::RenderNeeded,
                ];
                if let Some(anchor) = self.pin_anchor(pin) {
                    out.push(ViewerAction::PopoverOpened { pin, anchor });
                }
                out
            }
        }
    }

    /// A report card in the tray was clicked.
    pub fn on_card_click(&mut self, card: &str) -> Vec<ViewerAction> {
        match self.link.link_target_to(&mut self.book, card) {
            Ok(Some(change)) => {
                let mut out = vec![
                    ViewerAction::PinsChanged,
                    ViewerAction::TrayHighlightChanged { link_mode: self.link.is_link_mode() },
                    ViewerAction::RenderNeeded,
                ];
                if let Some(anchor) = self.pin_anchor(change.pin) {
                    out.push(ViewerAction::PopoverOpened { pin: change.pin, anchor });
                }
                out
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                debug!(%err, card, "viewer: link failed");
                self.link.cancel();
                vec![ViewerAction::PopoverClosed, ViewerAction::TrayHighlightChanged { link_mode: false }]
            }
        }
    }

    /// The popover's unlink button.
    pub fn unlink_pin(&mut self, pin: PinId) -> Vec<ViewerAction> {
        match self.link.unlink(&mut self.book, pin) {
            Ok(_) => {
                let mut out = vec![
                    ViewerAction::PinsChanged,
                    ViewerAction::TrayHighlightChanged { link_mode: true },
                    ViewerAction::RenderNeeded,
                ];
                if let Some(anchor) = self.pin_anchor(pin) {
                    out.push(ViewerAction::PopoverOpened { pin, anchor });
                }
                out
            }
            Err(err) => {
                debug!(%err, "viewer: unlink failed");
                Vec::new()
            }
        }
    }

    /// The popover's delete button, or an eraser click.
    pub fn delete_pin(&mut self, pin: PinId) -> Vec<ViewerAction> {
        if self.book.delete(&pin).is_none() {
            return Vec::new();
        }
        info!(%pin, "viewer: pin deleted");
        let mut out = vec![ViewerAction::PinsChanged, ViewerAction::RenderNeeded];
        if self.link.on_pin_deleted(pin) {
            out.push(ViewerAction::PopoverClosed);
        }
        out.push(ViewerAction::TrayHighlightChanged { link_mode: self.link.is_link_mode() });
        out
    }

    /// A report item was deleted elsewhere; its pins stay but lose the link.
    pub fn on_report_card_deleted(&mut self, card: &str) -> Vec<ViewerAction> {
        if self.book.unlink_card(card) == 0 {
            return Vec::new();
        }
        vec![
            ViewerAction::PinsChanged,
            ViewerAction::TrayHighlightChanged { link_mode: self.link.is_link_mode() },
            ViewerAction::RenderNeeded,
        ]
    }

    /// Cards the tray should highlight as link targets.
    #[must_use]
    pub fn highlightable_cards<'a>(&self, cards: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        self.link.highlightable_cards(cards, &self.book)
    }

    /// Pins of the current plan in screen space.
    #[must_use]
    pub fn glyphs(&self) -> Vec<PinGlyph> {
        let Some(plan) = self.current_plan() else {
            return Vec::new();
        };
        let target = self.link.link_target();
        self.book
            .pins_for_plan(&plan.id)
            .map(|pin| PinGlyph {
                id: pin.id,
                screen: self.camera.plan_to_screen(pin.position(), plan.size()),
                head_color: pin.head_color.clone(),
                linked: pin.is_linked(),
                selected: target == Some(pin.id),
            })
            .collect()
    }

    fn pin_anchor(&self, pin: PinId) -> Option<Point> {
        let plan = self.current_plan()?;
        let pin = self.book.get(&pin).filter(|p| p.plan_id == plan.id)?;
        Some(self.camera.plan_to_screen(pin.position(), plan.size()))
    }

    // --- Plans ---

    pub fn next_plan(&mut self) -> Vec<ViewerAction> {
        let count = self.plan_count();
        if self.plan_index + 1 >= count {
            return Vec::new();
        }
        self.go_to_plan(self.plan_index + 1)
    }

    pub fn prev_plan(&mut self) -> Vec<ViewerAction> {
        if self.plan_index == 0 {
            return Vec::new();
        }
        self.go_to_plan(self.plan_index - 1)
    }

    fn go_to_plan(&mut self, index: usize) -> Vec<ViewerAction> {
        let mut out = Vec::new();
        self.cancel_link(&mut out);
        self.press = None;
        self.plan_index = index;
        self.fit();
        out.push(self.plan_changed());
        out.push(ViewerAction::RenderNeeded);
        out
    }

    fn plan_changed(&self) -> ViewerAction {
        ViewerAction::PlanChanged { index: self.plan_index, count: self.plan_count() }
    }

    fn plan_count(&self) -> usize {
        self.card.as_ref().map_or(0, |c| c.plans.len())
    }

    // --- Queries ---

    #[must_use]
    pub fn current_plan(&self) -> Option<&Plan> {
        self.card.as_ref()?.plans.get(self.plan_index)
    }

    #[must_use]
    pub fn card(&self) -> Option<&FloorPlanCard> {
        self.card.as_ref()
    }

    #[must_use]
    pub fn plan_index(&self) -> usize {
        self.plan_index
    }

    #[must_use]
    pub fn camera(&self) -> &PlanCamera {
        &self.camera
    }

    #[must_use]
    pub fn pins(&self) -> &PinBook {
        &self.book
    }

    #[must_use]
    pub fn link(&self) -> &PinLinkController {
        &self.link
    }

    #[must_use]
    pub fn palette(&self) -> &PinPalette {
        &self.palette
    }

    /// Drop pending link state, reporting what the host must hide.
    fn cancel_link(&mut self, out: &mut Vec<ViewerAction>) {
        let had_popover = self.link.popover().is_some();
        let was_link_mode = self.link.is_link_mode();
        if !self.link.cancel() {
            return;
        }
        if had_popover {
            out.push(ViewerAction::PopoverClosed);
        }
        if was_link_mode {
            out.push(ViewerAction::TrayHighlightChanged { link_mode: false });
        }
        out.push(ViewerAction::RenderNeeded);
    }
}

fn cursor_for(tool: Tool) -> &'static str {
    match tool {
        Tool::Pin => "crosshair",
        Tool::Eraser => "pointer",
        _ => "grab",
    }
}
