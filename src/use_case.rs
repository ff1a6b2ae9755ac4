//! Use-case progress simulator (streaming, gaming, software updates).
//!
//! Selecting a case buffers for 1.5s, then fills a progress bar at a per-case
//! rate. Switching cases throws the current run away and starts over.

use tracing::{debug, info};

use crate::clock::{Animated, Millis};
use crate::error::{ExplorerError, Outcome, Result};
use crate::stepper::{RetriggerPolicy, Ticker, TimedStepper};

pub const BUFFERING_MS: Millis = 1_500;
pub const PROGRESS_TICK_MS: Millis = 100;
pub const PROGRESS_MAX: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CaseKind {
    #[default]
    Streaming,
    Gaming,
    Updates,
}

impl CaseKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streaming" => Ok(CaseKind::Streaming),
            "gaming" => Ok(CaseKind::Gaming),
            "updates" | "software" => Ok(CaseKind::Updates),
            _ => Err(ExplorerError::InvalidArgument(format!(
                "unknown use case {s:?} (expected streaming|gaming|updates)"
            ))),
        }
    }

    /// Progress points added per tick.
    pub fn rate(self) -> u8 {
        match self {
            CaseKind::Streaming => 2,
            CaseKind::Gaming => 10,
            CaseKind::Updates => 5,
        }
    }

    /// Time from selection until progress reaches 100.
    pub fn completion_ms(self) -> Millis {
        let ticks = PROGRESS_MAX.div_ceil(self.rate()) as Millis;
        BUFFERING_MS + ticks * PROGRESS_TICK_MS
    }

    pub fn label(self) -> &'static str {
        match self {
            CaseKind::Streaming => "Streaming",
            CaseKind::Gaming => "Gaming",
            CaseKind::Updates => "Software",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            CaseKind::Streaming => {
                "CDNs cache video segments near users to prevent buffering interruptions."
            }
            CaseKind::Gaming => {
                "Multiplayer servers rely on CDNs to route traffic via the fastest path to reduce lag."
            }
            CaseKind::Updates => {
                "Global software releases are distributed to thousands of servers so downloads don't crash the main site."
            }
        }
    }

    pub fn all() -> &'static [CaseKind] {
        &[CaseKind::Streaming, CaseKind::Gaming, CaseKind::Updates]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaybackPhase {
    Idle,
    Buffering,
    Playing,
}

const PLAYBACK: &[(Millis, PlaybackPhase)] = &[
    (0, PlaybackPhase::Buffering),
    (BUFFERING_MS, PlaybackPhase::Playing),
];

/// Observable state of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UseCaseRun {
    pub case_kind: CaseKind,
    pub progress: u8,
    pub buffering: bool,
}

#[derive(Debug)]
pub struct UseCaseSimulator {
    kind: CaseKind,
    progress: u8,
    phase: TimedStepper<PlaybackPhase>,
    ticker: Ticker,
}

impl Default for UseCaseSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl UseCaseSimulator {
    pub fn new() -> Self {
        Self {
            kind: CaseKind::default(),
            progress: 0,
            phase: TimedStepper::new(PlaybackPhase::Idle, RetriggerPolicy::Restart),
            ticker: Ticker::new(PROGRESS_TICK_MS),
        }
    }

    /// Start the default case, as the panel does when it first appears.
    pub fn mount(&mut self, now: Millis) -> Result<()> {
        self.restart(now, self.kind)
    }

    pub fn kind(&self) -> CaseKind {
        self.kind
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase.state()
    }

    pub fn is_buffering(&self) -> bool {
        self.phase() == PlaybackPhase::Buffering
    }

    pub fn run(&self) -> UseCaseRun {
        UseCaseRun {
            case_kind: self.kind,
            progress: self.progress,
            buffering: self.is_buffering(),
        }
    }

    /// Switch to `kind`. Re-selecting the running case changes nothing.
    pub fn select(&mut self, now: Millis, kind: CaseKind) -> Result<Outcome> {
        if kind == self.kind && self.phase() != PlaybackPhase::Idle {
            debug!(?kind, "use case already selected");
            return Ok(Outcome::Ignored);
        }
        self.restart(now, kind)?;
        Ok(Outcome::Accepted)
    }

    fn restart(&mut self, now: Millis, kind: CaseKind) -> Result<()> {
        self.ticker.stop();
        self.kind = kind;
        self.progress = 0;
        self.phase.trigger(now, PLAYBACK)?;
        info!(?kind, now, "use case simulation started");
        Ok(())
    }

    pub fn ping_ms(&self) -> u32 {
        if self.is_buffering() {
            154
        } else {
            24
        }
    }

    pub fn link_status(&self) -> &'static str {
        if self.is_buffering() {
            "Routing to Origin (High Latency)"
        } else {
            "Connected to Edge Node (Low Latency)"
        }
    }

    pub fn throughput_label(&self) -> &'static str {
        if self.is_buffering() {
            "Estimating..."
        } else {
            "12MB/s"
        }
    }

    fn apply_ticks(&mut self, now: Millis) {
        while self.progress < PROGRESS_MAX {
            if self.ticker.next_tick(now).is_none() {
                break;
            }
            self.progress = self
                .progress
                .saturating_add(self.kind.rate())
                .min(PROGRESS_MAX);
        }
        if self.progress >= PROGRESS_MAX && self.ticker.is_running() {
            self.ticker.stop();
            info!(kind = ?self.kind, "use case progress complete");
        }
    }
}

impl Animated for UseCaseSimulator {
    fn advance_to(&mut self, now: Millis) {
        for (at, phase) in self.phase.advance_to(now) {
            if phase == PlaybackPhase::Playing {
                self.ticker.start(at);
            }
        }
        self.apply_ticks(now);
    }

    fn cancel(&mut self) {
        self.phase.cancel();
        self.ticker.stop();
        self.progress = 0;
    }

    fn next_deadline(&self) -> Option<Millis> {
        match (self.phase.next_deadline(), self.ticker.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn is_active(&self) -> bool {
        self.phase.is_active() || self.ticker.is_running()
    }
}
