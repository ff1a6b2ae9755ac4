//! Virtual time.
//!
//! Every animation in the explorer is driven by explicit virtual time instead of
//! wall-clock callbacks. A panel owns a [`Timeline`] of pending events; the shell
//! owns a [`VirtualClock`] and tells the active panel how far time has moved.
//! Tests fast-forward by calling `advance` with arbitrary step sizes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{ExplorerError, Result};

/// Virtual milliseconds since the shell was created.
pub type Millis = u64;

/// Monotonic virtual clock owned by the view shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualClock {
    now: Millis,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self { now: 0 }
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Move forward by `by` milliseconds and return the new time.
    pub fn advance(&mut self, by: Millis) -> Millis {
        self.now = self.now.saturating_add(by);
        self.now
    }

    /// Jump to an absolute time. Going backwards is rejected.
    pub fn advance_to(&mut self, t: Millis) -> Result<Millis> {
        if t < self.now {
            return Err(ExplorerError::ClockRewind {
                now: self.now,
                requested: t,
            });
        }
        self.now = t;
        Ok(self.now)
    }
}

#[derive(Debug)]
struct Scheduled<E> {
    at: Millis,
    seq: u64,
    generation: u64,
    event: E,
}

// Min-heap on (deadline, insertion order). The event payload takes no part in ordering.
impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.at.cmp(&self.at).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<E> Eq for Scheduled<E> {}

/// Pending timer events for a single component instance.
///
/// Entries fire in deadline order; entries sharing a deadline fire in the order
/// they were scheduled. [`Timeline::cancel`] starts a new generation: nothing
/// scheduled before it can ever be delivered afterwards.
#[derive(Debug)]
pub struct Timeline<E> {
    now: Millis,
    generation: u64,
    next_seq: u64,
    pending: BinaryHeap<Scheduled<E>>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self {
            now: 0,
            generation: 0,
            next_seq: 0,
            pending: BinaryHeap::new(),
        }
    }

    /// Local notion of "now": the last instant this timeline was advanced to.
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sync the local clock forward. Never moves backwards.
    pub fn sync(&mut self, now: Millis) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Schedule `event` at an absolute deadline.
    pub fn schedule_at(&mut self, at: Millis, event: E) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.pending.push(Scheduled {
            at,
            seq,
            generation: self.generation,
            event,
        });
    }

    /// Schedule `event` `delay` milliseconds after the local now.
    pub fn schedule_in(&mut self, delay: Millis, event: E) {
        self.schedule_at(self.now.saturating_add(delay), event);
    }

    /// Drop every pending event and invalidate the current generation.
    /// Returns how many events were discarded.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.generation = self.generation.wrapping_add(1);
        dropped
    }

    /// Pop the next event due at or before `until`, moving local now to its deadline.
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, E)> {
        loop {
            let head = self.pending.peek()?;
            if head.at > until {
                return None;
            }
            let entry = self.pending.pop()?;
            if entry.generation != self.generation {
                continue;
            }
            self.sync(entry.at);
            return Some((entry.at, entry.event));
        }
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending
            .iter()
            .filter(|e| e.generation == self.generation)
            .map(|e| e.at)
            .min()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Time-driven component contract.
///
/// Implementors own their timers. `cancel` must be called before a component is
/// reset or dropped by its owner; afterwards no previously scheduled event may
/// mutate it.
pub trait Animated {
    /// Deliver every event due at or before `now`, in order.
    fn advance_to(&mut self, now: Millis);

    /// Invalidate all pending events and return to the idle state.
    fn cancel(&mut self);

    /// Deadline of the next pending event, if any.
    fn next_deadline(&self) -> Option<Millis>;

    /// True while a run is in flight.
    fn is_active(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_fire_in_deadline_then_insertion_order() {
        let mut tl = Timeline::new();
        tl.schedule_at(200, "c");
        tl.schedule_at(100, "a");
        tl.schedule_at(100, "b");

        let mut seen = Vec::new();
        while let Some((at, e)) = tl.pop_due(1_000) {
            seen.push((at, e));
        }
        assert_eq!(seen, vec![(100, "a"), (100, "b"), (200, "c")]);
        assert_eq!(tl.now(), 200);
    }

    #[test]
    fn nothing_due_before_deadline() {
        let mut tl = Timeline::new();
        tl.schedule_in(500, ());
        assert!(tl.pop_due(499).is_none());
        assert_eq!(tl.pop_due(500), Some((500, ())));
    }

    #[test]
    fn cancel_discards_pending_and_bumps_generation() {
        let mut tl = Timeline::new();
        tl.schedule_in(10, 1);
        tl.schedule_in(20, 2);
        let gen = tl.generation();

        assert_eq!(tl.cancel(), 2);
        assert!(tl.is_empty());
        assert_eq!(tl.generation(), gen + 1);
        assert!(tl.pop_due(u64::MAX).is_none());
        assert_eq!(tl.next_deadline(), None);
    }

    #[test]
    fn clock_refuses_to_rewind() {
        let mut clock = VirtualClock::new();
        clock.advance(300);
        assert!(matches!(
            clock.advance_to(100),
            Err(ExplorerError::ClockRewind { now: 300, requested: 100 })
        ));
        assert_eq!(clock.advance_to(300).ok(), Some(300));
    }
}
