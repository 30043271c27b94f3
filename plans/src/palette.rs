//! Pin head colours.
//!
//! Each floor-plan card draws its pin colours from a fixed palette without
//! repeats until every colour has been used, then starts over.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::debug;

use crate::model::{FloorPlanId, Pin};

/// Forty distinct head colours.
pub const PIN_COLORS: [&str; 40] = [
    "#3b82f6", "#22c55e", "#dc2626", "#fff200", "#8b5cf6", "#f97316", "#ec4899", "#06b6d4",
    "#84cc16", "#f59e0b", "#10b981", "#e11d48", "#7c3aed", "#0d9488", "#be185d", "#4338ca",
    "#ca8a04", "#2563eb", "#15803d", "#b45309", "#a21caf", "#134e4a", "#713f12", "#991b1b",
    "#14532d", "#86198f", "#312e81", "#155e75", "#365314", "#a16207", "#7f1d1d", "#059669",
    "#7c2d12", "#92400e", "#c2410c", "#9333ea", "#65a30d", "#9a3412", "#1e40af", "#166534",
];

/// Colours already handed out, per floor-plan card.
#[derive(Debug, Clone, Default)]
pub struct PinPalette {
    used: HashMap<FloorPlanId, HashSet<&'static str>>,
}

impl PinPalette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a colour not yet used on `card`, uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&mut self, card: FloorPlanId, rng: &mut R) -> &'static str {
        let used = self.used.entry(card).or_default();
        if used.len() >= PIN_COLORS.len() {
            debug!(%card, "palette: every pin colour used; resetting pool");
            used.clear();
        }
        let available: Vec<&'static str> = PIN_COLORS.iter().copied().filter(|c| !used.contains(c)).collect();
        let color = available[rng.random_range(0..available.len())];
        used.insert(color);
        color
    }

    /// Colours used so far on `card`.
    #[must_use]
    pub fn used_count(&self, card: &FloorPlanId) -> usize {
        self.used.get(card).map_or(0, HashSet::len)
    }

    /// Drop tracking for a deleted card.
    pub fn forget(&mut self, card: &FloorPlanId) {
        self.used.remove(card);
    }

    /// Rebuild the used sets from stored pins after a reload.
    pub fn seed_from_pins<'a>(&mut self, pins: impl IntoIterator<Item = &'a Pin>) {
        self.used.clear();
        for pin in pins {
            let lower = pin.head_color.to_ascii_lowercase();
            if let Some(color) = PIN_COLORS.iter().copied().find(|c| *c == lower) {
                self.used.entry(pin.card_id).or_default().insert(color);
            }
        }
    }
}
