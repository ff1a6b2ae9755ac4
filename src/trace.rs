//! Request trace: follows one request from the user through DNS to the edge,
//! and on a cache miss on to the origin, then back.

use tracing::{debug, info};

use crate::clock::{Animated, Millis};
use crate::error::{ExplorerError, Outcome, Result};
use crate::stepper::{RetriggerPolicy, TimedStepper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Scenario {
    Hit,
    Miss,
}

impl Scenario {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hit" => Ok(Scenario::Hit),
            "miss" => Ok(Scenario::Miss),
            _ => Err(ExplorerError::InvalidArgument(format!(
                "unknown scenario {s:?} (expected hit|miss)"
            ))),
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Scenario::Hit => "Trace: Cache Hit",
            Scenario::Miss => "Trace: Cache Miss",
        }
    }

    /// Transition table, offsets from the trigger instant.
    ///
    /// The offsets are hand-paced for the animation: a hit is back to idle at
    /// +4000ms, a miss at +5000ms.
    pub fn schedule(self) -> &'static [(Millis, TraceStep)] {
        match self {
            Scenario::Hit => HIT_SCHEDULE,
            Scenario::Miss => MISS_SCHEDULE,
        }
    }

    pub fn total_ms(self) -> Millis {
        self.schedule().last().map(|&(at, _)| at).unwrap_or(0)
    }
}

/// Where the request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceStep {
    Idle,
    /// User sends the request.
    AtUser,
    /// Resolver has routed the user to the edge; the edge is checking its cache.
    AtResolver,
    /// Edge missed; fetching from origin. Never visited on a hit.
    FetchOrigin,
    Delivered,
}

impl TraceStep {
    /// Numeric step as drawn by the diagram (resolver and edge share step 2).
    pub fn index(self) -> u8 {
        match self {
            TraceStep::Idle => 0,
            TraceStep::AtUser => 1,
            TraceStep::AtResolver => 2,
            TraceStep::FetchOrigin => 3,
            TraceStep::Delivered => 4,
        }
    }
}

const HIT_SCHEDULE: &[(Millis, TraceStep)] = &[
    (1_000, TraceStep::AtUser),
    (2_000, TraceStep::AtResolver),
    (3_000, TraceStep::Delivered),
    (4_000, TraceStep::Idle),
];

const MISS_SCHEDULE: &[(Millis, TraceStep)] = &[
    (1_000, TraceStep::AtUser),
    (2_000, TraceStep::AtResolver),
    (3_000, TraceStep::FetchOrigin),
    (4_000, TraceStep::Delivered),
    (5_000, TraceStep::Idle),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceNode {
    User,
    Resolver,
    Edge,
    Origin,
}

/// Status bubble above the edge node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeBadge {
    CheckingCache,
    Hit,
    Miss,
}

impl EdgeBadge {
    pub fn label(self) -> &'static str {
        match self {
            EdgeBadge::CheckingCache => "Checking Cache...",
            EdgeBadge::Hit => "HIT",
            EdgeBadge::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Trigger(Scenario),
    Cancel,
}

#[derive(Debug)]
pub struct RequestTrace {
    scenario: Scenario,
    stepper: TimedStepper<TraceStep>,
    visited: Vec<TraceStep>,
}

impl Default for RequestTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestTrace {
    pub fn new() -> Self {
        Self {
            scenario: Scenario::Hit,
            stepper: TimedStepper::new(TraceStep::Idle, RetriggerPolicy::Ignore),
            visited: Vec::new(),
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn step(&self) -> TraceStep {
        self.stepper.state()
    }

    /// Trigger buttons are disabled while this is true.
    pub fn is_animating(&self) -> bool {
        self.stepper.is_active()
    }

    /// Steps entered by the current (or last) run, in order.
    pub fn visited(&self) -> &[TraceStep] {
        &self.visited
    }

    pub fn apply(&mut self, now: Millis, event: TraceEvent) -> Result<Outcome> {
        match event {
            TraceEvent::Trigger(scenario) => self.trigger(now, scenario),
            TraceEvent::Cancel => {
                Animated::cancel(self);
                Ok(Outcome::Accepted)
            }
        }
    }

    /// Start a trace. The scenario is fixed for the whole run; a trigger while
    /// animating is dropped.
    pub fn trigger(&mut self, now: Millis, scenario: Scenario) -> Result<Outcome> {
        if self.is_animating() {
            debug!(?scenario, step = ?self.step(), "trace running; trigger ignored");
            return Ok(Outcome::Ignored);
        }
        let outcome = self.stepper.trigger(now, scenario.schedule())?;
        if outcome.is_accepted() {
            self.scenario = scenario;
            self.visited.clear();
            info!(?scenario, now, "request trace started");
        }
        Ok(outcome)
    }

    pub fn node_lit(&self, node: TraceNode) -> bool {
        let step = self.step().index();
        match node {
            TraceNode::User => step >= 1,
            TraceNode::Resolver | TraceNode::Edge => step >= 2,
            TraceNode::Origin => self.step() == TraceStep::FetchOrigin,
        }
    }

    /// The origin leg is only drawn for a miss.
    pub fn origin_shown(&self) -> bool {
        self.scenario == Scenario::Miss
    }

    pub fn edge_badge(&self) -> Option<EdgeBadge> {
        match (self.step(), self.scenario) {
            (TraceStep::AtResolver, _) => Some(EdgeBadge::CheckingCache),
            (TraceStep::FetchOrigin, Scenario::Miss) => Some(EdgeBadge::Miss),
            (TraceStep::FetchOrigin | TraceStep::Delivered, Scenario::Hit) => Some(EdgeBadge::Hit),
            _ => None,
        }
    }

    pub fn caption(&self) -> &'static str {
        match self.step() {
            TraceStep::Idle => "Click a button to start the request trace.",
            TraceStep::AtUser => "User sends a request for 'image.jpg'...",
            TraceStep::AtResolver => "DNS routes the user to the nearest Edge Server IP.",
            TraceStep::FetchOrigin => "Content not in Edge Cache. Fetching from Origin...",
            TraceStep::Delivered => "Content delivered to User! (Cached for next time)",
        }
    }
}

impl Animated for RequestTrace {
    fn advance_to(&mut self, now: Millis) {
        for (at, step) in self.stepper.advance_to(now) {
            self.visited.push(step);
            if step == TraceStep::Idle {
                info!(scenario = ?self.scenario, at, "request trace complete");
            }
        }
    }

    fn cancel(&mut self) {
        self.stepper.cancel();
    }

    fn next_deadline(&self) -> Option<Millis> {
        self.stepper.next_deadline()
    }

    fn is_active(&self) -> bool {
        self.is_animating()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(scenario: Scenario) -> RequestTrace {
        let mut t = RequestTrace::new();
        assert_eq!(t.trigger(0, scenario).ok(), Some(Outcome::Accepted));
        t.advance_to(scenario.total_ms());
        t
    }

    #[test]
    fn hit_never_visits_origin() {
        let t = run_to_end(Scenario::Hit);
        assert_eq!(
            t.visited(),
            &[
                TraceStep::AtUser,
                TraceStep::AtResolver,
                TraceStep::Delivered,
                TraceStep::Idle
            ]
        );
        assert!(!t.is_animating());
        assert!(!t.origin_shown());
    }

    #[test]
    fn miss_fetches_origin_between_edge_and_delivery() {
        let t = run_to_end(Scenario::Miss);
        assert_eq!(
            t.visited(),
            &[
                TraceStep::AtUser,
                TraceStep::AtResolver,
                TraceStep::FetchOrigin,
                TraceStep::Delivered,
                TraceStep::Idle
            ]
        );
        assert_eq!(t.step(), TraceStep::Idle);
    }

    #[test]
    fn exact_offsets() {
        let mut t = RequestTrace::new();
        let _ = t.trigger(0, Scenario::Hit);
        assert_eq!(t.step(), TraceStep::Idle);
        assert!(t.is_animating());

        t.advance_to(999);
        assert_eq!(t.step(), TraceStep::Idle);
        t.advance_to(1_000);
        assert_eq!(t.step(), TraceStep::AtUser);
        t.advance_to(2_000);
        assert_eq!(t.step(), TraceStep::AtResolver);
        assert_eq!(t.edge_badge(), Some(EdgeBadge::CheckingCache));
        t.advance_to(3_000);
        assert_eq!(t.step(), TraceStep::Delivered);
        assert_eq!(t.edge_badge(), Some(EdgeBadge::Hit));
        t.advance_to(3_999);
        assert!(t.is_animating());
        t.advance_to(4_000);
        assert!(!t.is_animating());
    }

    #[test]
    fn second_trigger_while_animating_changes_nothing() {
        let mut t = RequestTrace::new();
        let _ = t.trigger(0, Scenario::Hit);
        t.advance_to(2_500);
        let step = t.step();
        let deadline = t.next_deadline();

        assert_eq!(t.trigger(2_500, Scenario::Miss).ok(), Some(Outcome::Ignored));
        assert_eq!(t.step(), step);
        assert_eq!(t.scenario(), Scenario::Hit);
        assert_eq!(t.next_deadline(), deadline);
    }

    #[test]
    fn miss_lights_origin_only_while_fetching() {
        let mut t = RequestTrace::new();
        let _ = t.trigger(100, Scenario::Miss);
        t.advance_to(3_100);
        assert!(t.node_lit(TraceNode::Origin));
        assert!(t.node_lit(TraceNode::Edge));
        assert_eq!(t.edge_badge(), Some(EdgeBadge::Miss));
        assert_eq!(t.caption(), "Content not in Edge Cache. Fetching from Origin...");

        t.advance_to(4_100);
        assert!(!t.node_lit(TraceNode::Origin));
        assert_eq!(t.edge_badge(), None);
    }

    #[test]
    fn cancel_mid_run_returns_to_idle_for_good() {
        let mut t = RequestTrace::new();
        let _ = t.trigger(0, Scenario::Miss);
        t.advance_to(1_500);
        let _ = t.apply(1_500, TraceEvent::Cancel);
        assert_eq!(t.step(), TraceStep::Idle);
        t.advance_to(10_000);
        assert_eq!(t.visited(), &[TraceStep::AtUser]);
        assert!(!t.is_animating());
    }

    #[test]
    fn scenario_names_parse() {
        assert_eq!(Scenario::parse("HIT").ok(), Some(Scenario::Hit));
        assert_eq!(Scenario::parse(" miss ").ok(), Some(Scenario::Miss));
        assert!(matches!(
            Scenario::parse("stale"),
            Err(ExplorerError::InvalidArgument(_))
        ));
    }
}
