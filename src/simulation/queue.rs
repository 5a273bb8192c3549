//! Time-ordered event queue with lazy invalidation.

use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::events::Event;
use super::types::{EventId, SimTime};

/// Heap entry ordered earliest-first, ties broken by ascending event id
/// so same-time events pop in the order they were scheduled
#[derive(Debug, Clone)]
struct QueuedEvent(Event);

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        match OrderedFloat(self.0.time).cmp(&OrderedFloat(other.0.time)) {
            Ordering::Equal => self.0.id.cmp(&other.0.id),
            ord => ord,
        }
        // BinaryHeap is a max-heap; reverse for earliest-first popping
        .reverse()
    }
}

/// Priority queue of pending events.
///
/// Invalidation is lazy: a cancelled event's id leaves the live set right
/// away, but its heap entry is only discarded when it surfaces. Invalidating
/// an id that was never pushed, or was already popped, has no effect.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
    /// Ids pushed and neither popped nor invalidated yet
    live: HashSet<EventId>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.live.insert(event.id);
        self.heap.push(QueuedEvent(event));
    }

    /// Mark an event so it is discarded instead of popped
    pub fn invalidate(&mut self, id: EventId) {
        self.live.remove(&id);
    }

    /// Pop the earliest still-valid event, discarding invalidated entries
    pub fn pop_next_valid(&mut self) -> Option<Event> {
        while let Some(QueuedEvent(event)) = self.heap.pop() {
            if self.live.remove(&event.id) {
                return Some(event);
            }
        }
        None
    }

    /// Time of the earliest still-valid event without popping it.
    /// Invalidated entries encountered on the way are dropped.
    pub fn next_time(&mut self) -> Option<SimTime> {
        while let Some(QueuedEvent(event)) = self.heap.peek() {
            if self.live.contains(&event.id) {
                return Some(event.time);
            }
            self.heap.pop();
        }
        None
    }

    /// Number of still-valid events pending
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
