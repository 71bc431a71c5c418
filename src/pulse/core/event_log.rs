//! EventLog — append-only, ordered storage of interaction records.
//!
//! Purpose
//! -------
//! Hold the events of the current episode in insertion (= temporal) order.
//! The log performs no validation of its own beyond what [`Event::new`]
//! guarantees; vocabulary and reward-range checks happen in the model before
//! an event reaches [`EventLog::push`].
//!
//! Invariants
//! ----------
//! - Length is non-decreasing between calls to [`EventLog::clear`].
//! - Stored events are never modified or reordered.
use super::event::Event;

/// Append-only sequence of [`Event`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append one event. O(1) amortized.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Discard every event. Capacity is kept for the next episode.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at position `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Read-only view of all events in insertion order.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Restartable iterator over events in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// The most recent `n` events (fewer if the log is shorter), oldest first.
    pub fn tail(&self, n: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
