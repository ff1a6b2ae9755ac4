//! Side-by-side latency simulation (with and without an edge network).
//!
//! Each side runs a [`LatencyCounter`] that counts up to its path's target at a
//! fixed 50ms cadence. [`LatencyComparison`] opens a 3 second simulation window
//! that starts both counters together and pins them back to idle when it closes.

use tracing::{debug, info};

use crate::clock::{Animated, Millis};
use crate::error::{Outcome, Result};
use crate::stepper::{RetriggerPolicy, Ticker, TimedStepper};

/// Counter cadence.
pub const LATENCY_TICK_MS: Millis = 50;

/// How long the comparison stays in the simulating state after a trigger.
pub const SIMULATION_WINDOW_MS: Millis = 3_000;

/// Legacy latencies at or above this are reported as critical.
pub const CRITICAL_LATENCY_MS: u32 = 1_000;

/// Which network architecture a counter models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathKind {
    /// Users served by a nearby edge server.
    Optimized,
    /// Every request crosses to the single origin.
    Legacy,
}

impl PathKind {
    pub fn target_ms(self) -> u32 {
        match self {
            PathKind::Optimized => 200,
            PathKind::Legacy => 2_500,
        }
    }

    /// Increment per tick. Chosen so both paths finish in a similar number of ticks.
    pub fn step_ms(self) -> u32 {
        match self {
            PathKind::Optimized => 10,
            PathKind::Legacy => 50,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PathKind::Optimized => "Edge-Optimized Network",
            PathKind::Legacy => "Legacy Single-Origin Architecture",
        }
    }

    /// Node the user traffic is drawn from.
    pub fn serving_node(self) -> &'static str {
        match self {
            PathKind::Optimized => "edge",
            PathKind::Legacy => "origin",
        }
    }

    pub fn all() -> &'static [PathKind] {
        &[PathKind::Legacy, PathKind::Optimized]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LatencyStatus {
    Idle,
    Excellent,
    Good,
    Critical,
}

impl LatencyStatus {
    /// Pure classification of a displayed value.
    pub fn classify(value_ms: u32, path: PathKind) -> Self {
        if value_ms == 0 {
            return LatencyStatus::Idle;
        }
        match path {
            PathKind::Optimized => LatencyStatus::Excellent,
            PathKind::Legacy if value_ms < CRITICAL_LATENCY_MS => LatencyStatus::Good,
            PathKind::Legacy => LatencyStatus::Critical,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LatencyStatus::Idle => "Idle",
            LatencyStatus::Excellent => "Excellent",
            LatencyStatus::Good => "Good",
            LatencyStatus::Critical => "Critical",
        }
    }
}

/// Observable state of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationRun {
    pub path: PathKind,
    pub active: bool,
    pub finished: bool,
    pub target_latency_ms: u32,
    pub current_latency_ms: u32,
    pub step_size: u32,
    pub status: LatencyStatus,
    pub packets_in_flight: bool,
    pub route_visible: bool,
}

#[derive(Debug)]
pub struct LatencyCounter {
    path: PathKind,
    value: u32,
    triggered: bool,
    finished: bool,
    ticker: Ticker,
}

impl LatencyCounter {
    pub fn new(path: PathKind) -> Self {
        Self {
            path,
            value: 0,
            triggered: false,
            finished: false,
            ticker: Ticker::new(LATENCY_TICK_MS),
        }
    }

    pub fn path(&self) -> PathKind {
        self.path
    }

    pub fn value_ms(&self) -> u32 {
        self.value
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn status(&self) -> LatencyStatus {
        LatencyStatus::classify(self.value, self.path)
    }

    /// Packets animate while the counter is still climbing.
    pub fn packets_in_flight(&self) -> bool {
        self.triggered && !self.finished
    }

    /// Route lines stay drawn for the whole triggered period.
    pub fn route_visible(&self) -> bool {
        self.triggered
    }

    /// Start counting from zero. Restarts if already running.
    pub fn trigger(&mut self, now: Millis) {
        if self.ticker.is_running() {
            debug!(path = ?self.path, value = self.value, "latency counter restarted");
        }
        self.value = 0;
        self.finished = false;
        self.triggered = true;
        self.ticker.start(now);
    }

    /// Stop and pin the display back to zero.
    pub fn stop(&mut self) {
        self.ticker.stop();
        self.value = 0;
        self.finished = false;
        self.triggered = false;
    }

    pub fn run(&self) -> SimulationRun {
        SimulationRun {
            path: self.path,
            active: self.triggered,
            finished: self.finished,
            target_latency_ms: self.path.target_ms(),
            current_latency_ms: self.value,
            step_size: self.path.step_ms(),
            status: self.status(),
            packets_in_flight: self.packets_in_flight(),
            route_visible: self.route_visible(),
        }
    }
}

impl Animated for LatencyCounter {
    fn advance_to(&mut self, now: Millis) {
        while !self.finished {
            let Some(at) = self.ticker.next_tick(now) else {
                break;
            };
            let target = self.path.target_ms();
            self.value = self.value.saturating_add(self.path.step_ms()).min(target);
            if self.value == target {
                self.finished = true;
                self.ticker.stop();
                info!(path = ?self.path, at, latency_ms = self.value, "latency target reached");
            }
        }
    }

    fn cancel(&mut self) {
        self.stop();
    }

    fn next_deadline(&self) -> Option<Millis> {
        self.ticker.next_deadline()
    }

    fn is_active(&self) -> bool {
        self.ticker.is_running()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimulationPhase {
    Idle,
    Simulating,
}

const SIMULATION_WINDOW: &[(Millis, SimulationPhase)] = &[
    (0, SimulationPhase::Simulating),
    (SIMULATION_WINDOW_MS, SimulationPhase::Idle),
];

/// Both counters driven by one shared simulation window.
#[derive(Debug)]
pub struct LatencyComparison {
    window: TimedStepper<SimulationPhase>,
    legacy: LatencyCounter,
    optimized: LatencyCounter,
}

impl Default for LatencyComparison {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyComparison {
    pub fn new() -> Self {
        Self {
            window: TimedStepper::new(SimulationPhase::Idle, RetriggerPolicy::Ignore),
            legacy: LatencyCounter::new(PathKind::Legacy),
            optimized: LatencyCounter::new(PathKind::Optimized),
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        self.window.state()
    }

    pub fn is_simulating(&self) -> bool {
        self.phase() == SimulationPhase::Simulating
    }

    pub fn counter(&self, path: PathKind) -> &LatencyCounter {
        match path {
            PathKind::Optimized => &self.optimized,
            PathKind::Legacy => &self.legacy,
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_simulating() {
            "Simulating Traffic..."
        } else {
            "Simulate Global Request"
        }
    }

    /// Open the simulation window. Ignored while one is already open.
    pub fn trigger(&mut self, now: Millis) -> Result<Outcome> {
        let outcome = self.window.trigger(now, SIMULATION_WINDOW)?;
        if outcome.is_accepted() {
            info!(now, "global request simulation started");
            self.legacy.trigger(now);
            self.optimized.trigger(now);
        }
        Ok(outcome)
    }

    fn advance_counters(&mut self, now: Millis) {
        self.legacy.advance_to(now);
        self.optimized.advance_to(now);
    }
}

impl Animated for LatencyComparison {
    fn advance_to(&mut self, now: Millis) {
        // Counter ticks before the window closes must land before the close pins them.
        while let Some(close) = self.window.next_deadline().filter(|&t| t <= now) {
            self.advance_counters(close);
            self.window.advance_to(close);
            if !self.is_simulating() {
                self.legacy.stop();
                self.optimized.stop();
                info!(at = close, "global request simulation finished");
            }
        }
        self.advance_counters(now);
        self.window.advance_to(now);
    }

    fn cancel(&mut self) {
        self.window.cancel();
        self.legacy.stop();
        self.optimized.stop();
    }

    fn next_deadline(&self) -> Option<Millis> {
        [
            self.window.next_deadline(),
            self.legacy.next_deadline(),
            self.optimized.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn is_active(&self) -> bool {
        self.window.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_counter_is_pinned_to_zero() {
        let mut c = LatencyCounter::new(PathKind::Legacy);
        c.advance_to(10_000);
        assert_eq!(c.value_ms(), 0);
        assert_eq!(c.status(), LatencyStatus::Idle);
        assert!(!c.packets_in_flight());
    }

    #[test]
    fn counters_climb_monotonically_and_clamp_to_target() {
        for &path in PathKind::all() {
            let mut c = LatencyCounter::new(path);
            c.trigger(0);
            let mut last = 0;
            for t in (0..=4_000).step_by(7) {
                c.advance_to(t);
                assert!(c.value_ms() >= last, "{path:?} went backwards at {t}");
                assert!(c.value_ms() <= path.target_ms());
                last = c.value_ms();
            }
            assert_eq!(c.value_ms(), path.target_ms());
            assert!(c.is_finished());
            assert!(!c.is_active());
        }
    }

    #[test]
    fn both_paths_finish_in_comparable_tick_counts() {
        let mut fast = LatencyCounter::new(PathKind::Optimized);
        let mut slow = LatencyCounter::new(PathKind::Legacy);
        fast.trigger(0);
        slow.trigger(0);

        fast.advance_to(999);
        assert!(!fast.is_finished());
        fast.advance_to(1_000);
        assert!(fast.is_finished());

        slow.advance_to(2_499);
        assert_eq!(slow.value_ms(), 2_450);
        slow.advance_to(2_500);
        assert_eq!(slow.value_ms(), 2_500);
    }

    #[test]
    fn packets_fly_until_target_while_route_stays_drawn() {
        let mut c = LatencyCounter::new(PathKind::Optimized);
        c.trigger(0);
        c.advance_to(500);
        let run = c.run();
        assert!(run.active);
        assert!(run.packets_in_flight);
        assert!(run.route_visible);
        assert_eq!(run.current_latency_ms, 100);

        c.advance_to(1_000);
        let run = c.run();
        assert!(run.finished);
        assert!(!run.packets_in_flight);
        assert!(run.route_visible);

        c.stop();
        assert!(!c.route_visible());
        assert!(!c.packets_in_flight());
    }

    #[test]
    fn status_classification() {
        assert_eq!(LatencyStatus::classify(0, PathKind::Optimized), LatencyStatus::Idle);
        assert_eq!(LatencyStatus::classify(0, PathKind::Legacy), LatencyStatus::Idle);
        assert_eq!(LatencyStatus::classify(200, PathKind::Optimized), LatencyStatus::Excellent);
        assert_eq!(LatencyStatus::classify(950, PathKind::Legacy), LatencyStatus::Good);
        assert_eq!(LatencyStatus::classify(1_000, PathKind::Legacy), LatencyStatus::Critical);
        assert_eq!(LatencyStatus::Critical.label(), "Critical");
    }

    #[test]
    fn retrigger_restarts_counter_from_zero() {
        let mut c = LatencyCounter::new(PathKind::Legacy);
        c.trigger(0);
        c.advance_to(500);
        assert_eq!(c.value_ms(), 500);

        c.trigger(500);
        assert_eq!(c.value_ms(), 0);
        c.advance_to(550);
        assert_eq!(c.value_ms(), 50);
    }

    #[test]
    fn comparison_window_resets_counters_when_it_closes() {
        let mut cmp = LatencyComparison::new();
        assert_eq!(cmp.trigger(0).ok(), Some(Outcome::Accepted));
        assert!(cmp.is_simulating());
        assert_eq!(cmp.button_label(), "Simulating Traffic...");

        cmp.advance_to(2_999);
        assert_eq!(cmp.counter(PathKind::Legacy).value_ms(), 2_500);
        assert_eq!(cmp.counter(PathKind::Legacy).status(), LatencyStatus::Critical);
        assert_eq!(cmp.counter(PathKind::Optimized).value_ms(), 200);
        assert!(cmp.counter(PathKind::Optimized).route_visible());

        cmp.advance_to(3_000);
        assert!(!cmp.is_simulating());
        for &path in PathKind::all() {
            assert_eq!(cmp.counter(path).value_ms(), 0);
            assert_eq!(cmp.counter(path).status(), LatencyStatus::Idle);
        }
        assert_eq!(cmp.next_deadline(), None);
    }

    #[test]
    fn comparison_ignores_trigger_while_simulating() {
        let mut cmp = LatencyComparison::new();
        let _ = cmp.trigger(0);
        cmp.advance_to(400);
        let before = cmp.counter(PathKind::Optimized).value_ms();

        assert_eq!(cmp.trigger(400).ok(), Some(Outcome::Ignored));
        assert_eq!(cmp.counter(PathKind::Optimized).value_ms(), before);

        cmp.advance_to(3_000);
        assert_eq!(cmp.trigger(3_000).ok(), Some(Outcome::Accepted));
    }

    #[test]
    fn cancel_stops_everything() {
        let mut cmp = LatencyComparison::new();
        let _ = cmp.trigger(0);
        cmp.advance_to(100);
        cmp.cancel();
        cmp.advance_to(5_000);
        assert!(!cmp.is_simulating());
        assert_eq!(cmp.counter(PathKind::Legacy).value_ms(), 0);
        assert!(!cmp.is_active());
    }
}
