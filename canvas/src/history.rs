//! Undo/redo history: a bounded, linear list of snapshots with a cursor.
//!
//! DESIGN
//! ======
//! Entries are strictly ordered by commit. Moving the cursor back and then
//! committing truncates everything after the cursor; redo history is
//! discarded, never merged. When the list exceeds its cap the oldest entry is
//! evicted and the cursor shifts with it, so it keeps pointing at the entry
//! just committed.
//!
//! Captures are debounced against a caller-supplied monotonic clock
//! (milliseconds, e.g. `performance.now()`). A capture parks its state in a
//! pending slot; another capture inside the window replaces the parked state,
//! so a burst of captures yields one entry holding the last state.
//! [`HistoryStack::poll`] commits the parked state once the window has passed
//! since the last capture. Undo/redo commit it before moving so the on-screen
//! state is never skipped. Nothing here reads the wall clock.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use tracing::debug;

use crate::consts::{HISTORY_CAP, HISTORY_DEBOUNCE_MS};

/// One point-in-time snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<S> {
    pub state: S,
    /// Clock reading (ms) of the capture that produced the entry.
    pub timestamp_ms: f64,
}

/// What a call to [`HistoryStack::capture`] did with the previous pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Nothing was pending; the state is now parked.
    Parked,
    /// A pending state inside the window was replaced.
    Merged,
    /// A pending state whose window had already passed was committed first.
    CommittedPrevious,
}

/// Bounded linear undo/redo stack over snapshot type `S`.
#[derive(Debug, Clone)]
pub struct HistoryStack<S> {
    entries: Vec<HistoryEntry<S>>,
    cursor: usize,
    cap: usize,
    debounce_ms: f64,
    pending: Option<HistoryEntry<S>>,
}

impl<S> Default for HistoryStack<S> {
    fn default() -> Self {
        Self::new(HISTORY_CAP, HISTORY_DEBOUNCE_MS)
    }
}

impl<S> HistoryStack<S> {
    /// Create an empty stack. A `cap` of zero is treated as one.
    #[must_use]
    pub fn new(cap: usize, debounce_ms: f64) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            cap: cap.max(1),
            debounce_ms: debounce_ms.max(0.0),
            pending: None,
        }
    }

    /// Park `state` captured at clock reading `now_ms`.
    pub fn capture(&mut self, state: S, now_ms: f64) -> Capture {
        let outcome = match &self.pending {
            None => Capture::Parked,
            Some(prev) if now_ms - prev.timestamp_ms < self.debounce_ms => Capture::Merged,
            Some(_) => {
                self.flush_pending();
                Capture::CommittedPrevious
            }
        };
        self.pending = Some(HistoryEntry { state, timestamp_ms: now_ms });
        outcome
    }

    /// Commit `state` right away, bypassing the debounce. Anything pending is
    /// committed first so ordering is kept.
    pub fn capture_now(&mut self, state: S, now_ms: f64) {
        self.flush_pending();
        self.commit(HistoryEntry { state, timestamp_ms: now_ms });
    }

    /// Commit the pending state if the window has passed since it was
    /// captured. Returns `true` if an entry was stored.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match &self.pending {
            Some(p) if now_ms - p.timestamp_ms >= self.debounce_ms => self.flush_pending(),
            _ => false,
        }
    }

    /// Commit the pending state immediately, ignoring the window.
    pub fn flush_pending(&mut self) -> bool {
        let Some(entry) = self.pending.take() else {
            return false;
        };
        self.commit(entry);
        true
    }

    /// Step back one entry and return it for restoring. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry<S>> {
        self.flush_pending();
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one entry and return it for restoring. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry<S>> {
        self.flush_pending();
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// Drop every entry and the pending capture.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.pending = None;
    }

    /// Whether an undo would move. A pending capture counts as a step once
    /// there is something to step back to.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0 || (self.pending.is_some() && !self.entries.is_empty())
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.pending.is_none() && self.cursor + 1 < self.entries.len()
    }

    /// Number of committed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry matching what is on screen. Meaningless while empty.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The entry under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&HistoryEntry<S>> {
        self.entries.get(self.cursor)
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    fn commit(&mut self, entry: HistoryEntry<S>) {
        if self.cursor + 1 < self.entries.len() {
            let dropped = self.entries.len() - self.cursor - 1;
            self.entries.truncate(self.cursor + 1);
            debug!(dropped, "history: redo branch discarded");
        }
        self.entries.push(entry);
        if self.entries.len() > self.cap {
            self.entries.remove(0);
            debug!(cap = self.cap, "history: evicted oldest entry");
        }
        self.cursor = self.entries.len() - 1;
        debug!(len = self.entries.len(), cursor = self.cursor, "history: entry committed");
    }
}
