//! The pins of one report, held in memory.
//!
//! A report item (card) is linked to at most one pin at a time. Linking a
//! card that another pin already holds moves the link.

#[cfg(test)]
#[path = "pins_test.rs"]
mod pins_test;

use tracing::{debug, info};
use uuid::Uuid;

use canvas::coords::Point;

use crate::model::{CardId, FloorPlanId, Pin, PinId, PlanId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PinError {
    #[error("pin {0} not found")]
    NotFound(PinId),
    #[error("pin position ({x}, {y}) is outside the plan")]
    OutOfBounds { x: String, y: String },
}

/// What [`PinBook::link_exclusive`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChange {
    pub pin: PinId,
    /// The pin that held the card before, now unlinked.
    pub displaced: Option<PinId>,
}

/// Everything needed to create a pin except its colour.
#[derive(Debug, Clone)]
pub struct NewPin {
    pub report_id: String,
    pub card_id: FloorPlanId,
    pub plan_id: PlanId,
    pub position: Point,
}

#[derive(Debug, Clone, Default)]
pub struct PinBook {
    pins: Vec<Pin>,
}

impl PinBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pins(pins: Vec<Pin>) -> Self {
        Self { pins }
    }

    /// Add a pin at a normalized position.
    ///
    /// # Errors
    ///
    /// Rejects positions outside `[0, 1]`.
    pub fn create(&mut self, new: NewPin, head_color: &str, now_ms: f64) -> Result<PinId, PinError> {
        let Point { x, y } = new.position;
        if !((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y)) {
            return Err(PinError::OutOfBounds { x: x.to_string(), y: y.to_string() });
        }
        let pin = Pin {
            id: Uuid::new_v4(),
            report_id: new.report_id,
            card_id: new.card_id,
            plan_id: new.plan_id,
            x,
            y,
            head_color: head_color.to_owned(),
            linked_card_id: None,
            created_at: now_ms,
        };
        let id = pin.id;
        debug!(%id, plan = %pin.plan_id, x, y, "pins: created");
        self.pins.push(pin);
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: &PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == *id)
    }

    fn get_mut(&mut self, id: &PinId) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.id == *id)
    }

    pub fn pins_for_plan<'a>(&'a self, plan: &'a PlanId) -> impl Iterator<Item = &'a Pin> + 'a {
        self.pins.iter().filter(move |p| p.plan_id == *plan)
    }

    pub fn pins_for_card<'a>(&'a self, card: &'a FloorPlanId) -> impl Iterator<Item = &'a Pin> + 'a {
        self.pins.iter().filter(move |p| p.card_id == *card)
    }

    /// The pin currently linked to a report card.
    #[must_use]
    pub fn linked_pin_for_card(&self, card: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.linked_card_id.as_deref() == Some(card))
    }

    /// Link `pin` to `card`, first unlinking any other pin holding the card.
    ///
    /// # Errors
    ///
    /// Fails if `pin` does not exist; nothing changes in that case.
    pub fn link_exclusive(&mut self, pin: &PinId, card: &str) -> Result<LinkChange, PinError> {
        if self.get(pin).is_none() {
            return Err(PinError::NotFound(*pin));
        }
        let mut displaced = None;
        for other in &mut self.pins {
            if other.id != *pin && other.linked_card_id.as_deref() == Some(card) {
                other.linked_card_id = None;
                displaced = Some(other.id);
            }
        }
        if let Some(target) = self.get_mut(pin) {
            target.linked_card_id = Some(card.to_owned());
        }
        debug!(%pin, card, ?displaced, "pins: linked");
        Ok(LinkChange { pin: *pin, displaced })
    }

    /// Clear a pin's link. Returns the card it held.
    ///
    /// # Errors
    ///
    /// Fails if `pin` does not exist.
    pub fn unlink(&mut self, pin: &PinId) -> Result<Option<CardId>, PinError> {
        let target = self.get_mut(pin).ok_or(PinError::NotFound(*pin))?;
        Ok(target.linked_card_id.take())
    }

    pub fn delete(&mut self, pin: &PinId) -> Option<Pin> {
        let index = self.pins.iter().position(|p| p.id == *pin)?;
        Some(self.pins.remove(index))
    }

    /// A report card was deleted: unlink its pins but keep them.
    pub fn unlink_card(&mut self, card: &str) -> usize {
        let mut count = 0;
        for pin in &mut self.pins {
            if pin.linked_card_id.as_deref() == Some(card) {
                pin.linked_card_id = None;
                count += 1;
            }
        }
        count
    }

    /// A floor-plan card was deleted: drop all of its pins.
    pub fn remove_floor_plan_card(&mut self, card: &FloorPlanId) -> usize {
        let before = self.pins.len();
        self.pins.retain(|p| p.card_id != *card);
        let removed = before - self.pins.len();
        if removed > 0 {
            info!(%card, removed, "pins: cascade delete with floor-plan card");
        }
        removed
    }

    /// Card ids currently linked to some pin.
    pub fn linked_cards(&self) -> impl Iterator<Item = &str> {
        self.pins.iter().filter_map(|p| p.linked_card_id.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Pin] {
        &self.pins
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
