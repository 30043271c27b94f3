//! Floor plans and pins of one report, persisted through a [`KeyValueStore`].
//!
//! Every operation is a read-modify-write of a whole report-scoped key.
//! Reads that fail fall back to empty; writes that fail are logged and
//! reported as `false`, leaving the caller's in-memory state authoritative.

#[cfg(test)]
#[path = "repo_test.rs"]
mod repo_test;

use tracing::{debug, info};

use store::{KeyValueStore, read_json, remove_logged, scoped_key, write_json};

use crate::model::{FloorPlanCard, FloorPlanId, Pin};
use crate::palette::PinPalette;
use crate::pins::PinBook;

pub const FLOOR_PLANS_KEY_PREFIX: &str = "JL_floorplans_";
pub const PINS_KEY_PREFIX: &str = "JL_pins_";

pub struct PlanRepository<S: KeyValueStore> {
    store: S,
    report_id: String,
}

impl<S: KeyValueStore> PlanRepository<S> {
    #[must_use]
    pub fn new(store: S, report_id: impl Into<String>) -> Self {
        Self { store, report_id: report_id.into() }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    #[must_use]
    pub fn floor_plans_key(&self) -> String {
        scoped_key(FLOOR_PLANS_KEY_PREFIX, &self.report_id)
    }

    #[must_use]
    pub fn pins_key(&self) -> String {
        scoped_key(PINS_KEY_PREFIX, &self.report_id)
    }

    // --- Floor plans ---

    /// Floor-plan cards, newest first.
    pub async fn load_floor_plans(&self) -> Vec<FloorPlanCard> {
        read_json(&self.store, &self.floor_plans_key(), Vec::new()).await
    }

    pub async fn save_floor_plans(&self, cards: &[FloorPlanCard]) -> bool {
        write_json(&self.store, &self.floor_plans_key(), cards).await
    }

    /// Store a new card in front of the existing ones.
    pub async fn add_floor_plan_card(&self, card: FloorPlanCard) -> bool {
        let mut cards = self.load_floor_plans().await;
        cards.retain(|c| c.id != card.id);
        debug!(card = %card.id, filename = %card.filename, "repo: adding floor-plan card");
        cards.insert(0, card);
        self.save_floor_plans(&cards).await
    }

    /// Replace a stored card, e.g. after plans were appended to it. Returns
    /// `false` if the card is unknown or the write failed.
    pub async fn update_floor_plan_card(&self, card: &FloorPlanCard) -> bool {
        let mut cards = self.load_floor_plans().await;
        let Some(slot) = cards.iter_mut().find(|c| c.id == card.id) else {
            debug!(card = %card.id, "repo: update of unknown floor-plan card");
            return false;
        };
        slot.clone_from(card);
        self.save_floor_plans(&cards).await
    }

    pub async fn floor_plan_card(&self, id: &FloorPlanId) -> Option<FloorPlanCard> {
        self.load_floor_plans().await.into_iter().find(|c| c.id == *id)
    }

    /// Remove a card together with all of its pins and its colour tracking.
    pub async fn delete_floor_plan_card(&self, id: &FloorPlanId, palette: &mut PinPalette) -> bool {
        let mut cards = self.load_floor_plans().await;
        cards.retain(|c| c.id != *id);
        let cards_saved = self.save_floor_plans(&cards).await;

        let mut book = PinBook::from_pins(self.load_pins().await);
        let removed = book.remove_floor_plan_card(id);
        let pins_saved = self.save_pins(book.as_slice()).await;

        palette.forget(id);
        info!(card = %id, removed_pins = removed, "repo: deleted floor-plan card");
        cards_saved && pins_saved
    }

    // --- Pins ---

    pub async fn load_pins(&self) -> Vec<Pin> {
        read_json(&self.store, &self.pins_key(), Vec::new()).await
    }

    pub async fn save_pins(&self, pins: &[Pin]) -> bool {
        write_json(&self.store, &self.pins_key(), pins).await
    }

    /// A report item was deleted: unlink its pins, keeping them on the plan.
    /// Returns how many pins were unlinked.
    pub async fn handle_card_deletion(&self, card: &str) -> usize {
        let mut book = PinBook::from_pins(self.load_pins().await);
        let count = book.unlink_card(card);
        if count > 0 && !self.save_pins(book.as_slice()).await {
            debug!(card, "repo: unlink after card deletion kept in memory only");
        }
        count
    }

    // --- Report ---

    /// The report itself was deleted: drop its floor plans and pins.
    pub async fn delete_report(&self) -> bool {
        let plans = remove_logged(&self.store, &self.floor_plans_key()).await;
        let pins = remove_logged(&self.store, &self.pins_key()).await;
        info!(report = %self.report_id, "repo: deleted floor plans and pins of report");
        plans && pins
    }
}
