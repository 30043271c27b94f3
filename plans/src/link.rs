//! Pin placement, selection and card linking.
//!
//! The controller owns only the interaction state. Pins themselves live in a
//! [`PinBook`], passed in by the caller. The card tray is in link-target mode
//! while a pin was just placed or a pin is selected; clicking a card then
//! links it to [`PinLinkController::link_target`].

#[cfg(test)]
#[path = "link_test.rs"]
mod link_test;

use rand::Rng;
use tracing::debug;

use crate::model::{CardId, PinId};
use crate::palette::PinPalette;
use crate::pins::{LinkChange, NewPin, PinBook, PinError};

/// Result of [`PinLinkController::select_pin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The pin is now selected and its popover is open.
    Opened(PinId),
    /// The pin was already selected with its popover showing; both are closed.
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinLinkController {
    placing: bool,
    selected: Option<PinId>,
    just_placed: Option<PinId>,
    popover: Option<PinId>,
}

impl PinLinkController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pin with an unused colour for its floor-plan card, enter
    /// placing mode and open the pin's popover.
    ///
    /// # Errors
    ///
    /// Propagates [`PinError::OutOfBounds`]; the state is unchanged then.
    pub fn place_pin<R: Rng + ?Sized>(
        &mut self,
        book: &mut PinBook,
        palette: &mut PinPalette,
        rng: &mut R,
        new: NewPin,
        now_ms: f64,
    ) -> Result<PinId, PinError> {
        let color = palette.pick(new.card_id, rng);
        let id = book.create(new, color, now_ms)?;
        self.placing = true;
        self.selected = None;
        self.just_placed = Some(id);
        self.popover = Some(id);
        Ok(id)
    }

    /// Click on a pin. A second click on the pin whose popover is showing
    /// closes it and clears the selection.
    pub fn select_pin(&mut self, pin: PinId) -> Selection {
        let already = self.selected == Some(pin) || self.just_placed == Some(pin);
        if already && self.popover == Some(pin) {
            self.cancel();
            return Selection::Closed;
        }
        self.placing = false;
        self.selected = Some(pin);
        self.just_placed = None;
        self.popover = Some(pin);
        Selection::Opened(pin)
    }

    /// Link `pin` to `card`. Any other pin holding the card loses it. The
    /// selection is kept so the pin can be relinked straight away.
    ///
    /// # Errors
    ///
    /// Fails if the pin does not exist.
    pub fn link_to_card(&mut self, book: &mut PinBook, pin: PinId, card: &str) -> Result<LinkChange, PinError> {
        let change = book.link_exclusive(&pin, card)?;
        self.popover = Some(pin);
        Ok(change)
    }

    /// A tray card was clicked: link it to the current target, if any.
    ///
    /// # Errors
    ///
    /// Fails if the target pin has gone missing from `book`.
    pub fn link_target_to(&mut self, book: &mut PinBook, card: &str) -> Result<Option<LinkChange>, PinError> {
        let Some(pin) = self.link_target() else {
            debug!(card, "link: card clicked with no pin to link");
            return Ok(None);
        };
        self.link_to_card(book, pin, card).map(Some)
    }

    /// Clear the pin's link and select it for relinking.
    ///
    /// # Errors
    ///
    /// Fails if the pin does not exist.
    pub fn unlink(&mut self, book: &mut PinBook, pin: PinId) -> Result<Option<CardId>, PinError> {
        let previous = book.unlink(&pin)?;
        self.placing = false;
        self.selected = Some(pin);
        self.just_placed = None;
        self.popover = Some(pin);
        Ok(previous)
    }

    /// Drop any pending link operation and close the popover. Returns whether
    /// anything was active.
    pub fn cancel(&mut self) -> bool {
        let active = self.is_link_mode() || self.just_placed.is_some() || self.popover.is_some();
        *self = Self::default();
        active
    }

    /// Forget a deleted pin. Returns whether the popover closed.
    pub fn on_pin_deleted(&mut self, pin: PinId) -> bool {
        if self.selected == Some(pin) {
            self.selected = None;
        }
        if self.just_placed == Some(pin) {
            self.just_placed = None;
            self.placing = false;
        }
        if self.popover == Some(pin) {
            self.popover = None;
            return true;
        }
        false
    }

    /// The pin a card click links: the selected pin, else the one just placed.
    #[must_use]
    pub fn link_target(&self) -> Option<PinId> {
        self.selected.or(self.just_placed)
    }

    #[must_use]
    pub fn is_link_mode(&self) -> bool {
        self.placing || self.selected.is_some()
    }

    /// Cards to highlight in the tray: those not linked to any pin, and only
    /// while in link mode.
    #[must_use]
    pub fn highlightable_cards<'a>(&self, cards: impl IntoIterator<Item = &'a str>, book: &PinBook) -> Vec<&'a str> {
        if !self.is_link_mode() {
            return Vec::new();
        }
        cards
            .into_iter()
            .filter(|card| book.linked_pin_for_card(card).is_none())
            .collect()
    }

    #[must_use]
    pub fn popover(&self) -> Option<PinId> {
        self.popover
    }

    #[must_use]
    pub fn selected(&self) -> Option<PinId> {
        self.selected
    }

    #[must_use]
    pub fn just_placed(&self) -> Option<PinId> {
        self.just_placed
    }

    #[must_use]
    pub fn is_placing(&self) -> bool {
        self.placing
    }
}
