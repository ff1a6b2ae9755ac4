//! Interactive CDN explainer, driven by virtual time.
//!
//! Six panels (concept, mechanics, components, trade-offs, use cases, quiz)
//! mounted one at a time by [`shell::ExplorerShell`]. Every animation is a
//! timer on a millisecond [`clock::VirtualClock`], so a run is reproducible and
//! a front end only has to feed inputs and advance time.
//!
//! # Feature Flags
//!
//! - `std` (default): standard library support
//! - `serde` (default): snapshots, scripts, question banks and driver config
//!   as JSON
//!
//! # Example
//!
//! ```
//! use cdn_explorer::prelude::*;
//!
//! let mut shell = ExplorerShell::new();
//! shell.select_tab(Tab::Mechanics).unwrap();
//! shell.dispatch(Input::Trace { scenario: Scenario::Miss }).unwrap();
//! shell.advance(5_000);
//! assert!(shell.is_idle());
//! ```

#[path = "core/clock.rs"]
pub mod clock;

#[path = "core/stepper.rs"]
pub mod stepper;

pub mod content;
pub mod error;
pub mod explore;
pub mod latency;
pub mod quiz;
pub mod shell;
pub mod trace;
pub mod use_case;

#[cfg(feature = "serde")]
pub mod config;

#[cfg(feature = "serde")]
pub mod script;

pub mod prelude {
    pub use crate::clock::{Animated, Millis, Timeline, VirtualClock};
    pub use crate::content::{ComponentId, Question, QuestionBank};
    pub use crate::error::{ExplorerError, Outcome, Result};
    pub use crate::latency::{LatencyComparison, PathKind};
    pub use crate::quiz::Quiz;
    pub use crate::shell::{ExplorerShell, Input, Snapshot, Tab};
    pub use crate::stepper::{RetriggerPolicy, Ticker, TimedStepper};
    pub use crate::trace::{RequestTrace, Scenario};
    pub use crate::use_case::{CaseKind, UseCaseSimulator};

    #[cfg(feature = "serde")]
    pub use crate::script::Script;
}
