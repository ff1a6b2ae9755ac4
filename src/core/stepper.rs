//! Schedule-table state stepping and fixed-cadence ticking.

use core::fmt::Debug;

use tracing::debug;

use crate::clock::{Millis, Timeline};
use crate::error::{ExplorerError, Outcome, Result};

/// What a trigger does while a previous run is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RetriggerPolicy {
    /// Keep the current run; the new trigger is dropped.
    Ignore,
    /// Cancel the current run and start over.
    Restart,
}

/// Walks an ordered list of `(offset, state)` pairs.
///
/// Offsets are absolute from the trigger instant. Entries at offset 0 are applied
/// synchronously by [`TimedStepper::trigger`]; the rest are delivered by
/// [`TimedStepper::advance_to`]. A run is active until its last entry fires.
#[derive(Debug)]
pub struct TimedStepper<S> {
    idle: S,
    state: S,
    policy: RetriggerPolicy,
    started_at: Option<Millis>,
    timeline: Timeline<S>,
}

impl<S: Copy + PartialEq + Debug> TimedStepper<S> {
    pub fn new(idle: S, policy: RetriggerPolicy) -> Self {
        Self {
            idle,
            state: idle,
            policy,
            started_at: None,
            timeline: Timeline::new(),
        }
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn policy(&self) -> RetriggerPolicy {
        self.policy
    }

    pub fn is_active(&self) -> bool {
        !self.timeline.is_empty()
    }

    /// Trigger instant of the current (or last) run.
    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timeline.next_deadline()
    }

    /// Start a run. The state is reset to idle first, then offset-0 entries apply.
    pub fn trigger(&mut self, now: Millis, table: &[(Millis, S)]) -> Result<Outcome> {
        validate_table(table)?;

        if self.is_active() {
            match self.policy {
                RetriggerPolicy::Ignore => {
                    debug!(state = ?self.state, "stepper busy; trigger ignored");
                    return Ok(Outcome::Ignored);
                }
                RetriggerPolicy::Restart => {
                    let dropped = self.timeline.cancel();
                    debug!(dropped, "stepper restarted");
                }
            }
        }

        self.timeline.sync(now);
        self.state = self.idle;
        self.started_at = Some(now);
        for &(offset, next) in table {
            if offset == 0 {
                self.state = next;
            } else {
                self.timeline.schedule_at(now.saturating_add(offset), next);
            }
        }
        Ok(Outcome::Accepted)
    }

    /// Apply every transition due at or before `now`; returns them in firing order.
    pub fn advance_to(&mut self, now: Millis) -> Vec<(Millis, S)> {
        let mut fired = Vec::new();
        while let Some((at, next)) = self.timeline.pop_due(now) {
            debug!(at, from = ?self.state, to = ?next, "step");
            self.state = next;
            fired.push((at, next));
        }
        self.timeline.sync(now);
        fired
    }

    /// Drop the pending schedule and return to idle.
    pub fn cancel(&mut self) {
        self.timeline.cancel();
        self.state = self.idle;
    }
}

fn validate_table<S>(table: &[(Millis, S)]) -> Result<()> {
    if table.is_empty() {
        return Err(ExplorerError::InvalidArgument(
            "schedule table is empty".to_string(),
        ));
    }
    if table.windows(2).any(|w| w[1].0 < w[0].0) {
        return Err(ExplorerError::InvalidArgument(
            "schedule offsets must be non-decreasing".to_string(),
        ));
    }
    Ok(())
}

/// Fixed-cadence repeating timer.
///
/// Ticks land on exact multiples of `period` after the start instant no matter how
/// coarsely the owner advances time.
#[derive(Debug)]
pub struct Ticker {
    period: Millis,
    ticks: u64,
    timeline: Timeline<()>,
}

impl Ticker {
    pub fn new(period: Millis) -> Self {
        Self {
            period: period.max(1),
            ticks: 0,
            timeline: Timeline::new(),
        }
    }

    pub fn period(&self) -> Millis {
        self.period
    }

    /// Ticks delivered since the last `start`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        !self.timeline.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timeline.next_deadline()
    }

    /// (Re)start: the first tick lands one period after `now`.
    pub fn start(&mut self, now: Millis) {
        self.timeline.cancel();
        self.timeline.sync(now);
        self.ticks = 0;
        self.timeline.schedule_in(self.period, ());
    }

    pub fn stop(&mut self) {
        self.timeline.cancel();
    }

    /// Next tick at or before `until`, re-arming the following one.
    ///
    /// Callers loop on this and may `stop` between ticks.
    pub fn next_tick(&mut self, until: Millis) -> Option<Millis> {
        let (at, ()) = self.timeline.pop_due(until)?;
        self.ticks += 1;
        self.timeline.schedule_at(at.saturating_add(self.period), ());
        Some(at)
    }
}
