//! Presentation helpers that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module lets us unit-test the
//! styling rules on the host.

use cdn_explorer::clock::Millis;
use cdn_explorer::latency::{LatencyStatus, SimulationRun};
use cdn_explorer::quiz::OptionFeedback;
use cdn_explorer::shell::Tab;

/// Interval between animation frames in the browser.
pub const FRAME_INTERVAL_MS: i32 = 50;

/// Longest wall-clock gap fed to the shell in one frame.
pub const MAX_FRAME_STEP_MS: Millis = 250;

pub fn tab_icon(tab: Tab) -> &'static str {
    match tab {
        Tab::Concept => "🌍",
        Tab::Mechanics => "⚙️",
        Tab::Components => "🧩",
        Tab::TradeOffs => "⚖️",
        Tab::UseCases => "🎬",
        Tab::Quiz => "❓",
    }
}

pub fn status_class(status: LatencyStatus) -> &'static str {
    match status {
        LatencyStatus::Idle => "status idle",
        LatencyStatus::Excellent => "status excellent",
        LatencyStatus::Good => "status good",
        LatencyStatus::Critical => "status critical",
    }
}

pub fn option_class(feedback: OptionFeedback) -> &'static str {
    match feedback {
        OptionFeedback::Neutral => "option",
        OptionFeedback::Correct => "option correct",
        OptionFeedback::Incorrect => "option incorrect",
    }
}

pub fn node_class(lit: bool) -> &'static str {
    if lit {
        "node lit"
    } else {
        "node"
    }
}

/// CSS width for a 0..=100 progress value.
pub fn progress_width(progress: u8) -> String {
    format!("width: {}%;", progress.min(100))
}

/// How far a latency counter is towards its target, in percent.
pub fn latency_fill(run: &SimulationRun) -> u32 {
    if run.target_latency_ms == 0 {
        return 0;
    }
    (run.current_latency_ms.min(run.target_latency_ms) * 100) / run.target_latency_ms
}

pub fn route_class(run: &SimulationRun) -> &'static str {
    if !run.route_visible {
        "route hidden"
    } else if run.packets_in_flight {
        "route active"
    } else {
        "route idle"
    }
}

/// Wall-clock delta to feed the shell for one frame.
pub fn frame_step(elapsed_ms: f64) -> Millis {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0;
    }
    (elapsed_ms.round() as Millis).min(MAX_FRAME_STEP_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdn_explorer::clock::Animated;
    use cdn_explorer::latency::{LatencyCounter, PathKind};

    #[test]
    fn every_tab_has_an_icon() {
        for &tab in Tab::all() {
            assert!(!tab_icon(tab).trim().is_empty());
        }
        let mut icons: Vec<&str> = Tab::all().iter().copied().map(tab_icon).collect();
        icons.sort_unstable();
        icons.dedup();
        assert_eq!(icons.len(), Tab::all().len());
    }

    #[test]
    fn progress_width_is_capped() {
        assert_eq!(progress_width(0), "width: 0%;");
        assert_eq!(progress_width(42), "width: 42%;");
        assert_eq!(progress_width(250), "width: 100%;");
    }

    #[test]
    fn latency_fill_tracks_counter() {
        let idle = LatencyCounter::new(PathKind::Legacy).run();
        assert_eq!(latency_fill(&idle), 0);

        let mut run = idle;
        run.current_latency_ms = 1_250;
        assert_eq!(latency_fill(&run), 50);
        run.current_latency_ms = run.target_latency_ms;
        assert_eq!(latency_fill(&run), 100);
    }

    #[test]
    fn route_class_follows_counter() {
        let mut counter = LatencyCounter::new(PathKind::Optimized);
        assert_eq!(route_class(&counter.run()), "route hidden");

        counter.trigger(0);
        counter.advance_to(100);
        assert_eq!(route_class(&counter.run()), "route active");

        counter.advance_to(1_000);
        assert_eq!(route_class(&counter.run()), "route idle");

        counter.stop();
        assert_eq!(route_class(&counter.run()), "route hidden");
    }

    #[test]
    fn status_and_option_classes() {
        assert!(status_class(LatencyStatus::Critical).ends_with("critical"));
        assert_eq!(option_class(OptionFeedback::Correct), "option correct");
        assert_eq!(node_class(false), "node");
    }

    #[test]
    fn frame_step_clamps_large_gaps() {
        assert_eq!(frame_step(49.6), 50);
        assert_eq!(frame_step(-3.0), 0);
        assert_eq!(frame_step(f64::NAN), 0);
        assert_eq!(frame_step(10_000.0), MAX_FRAME_STEP_MS);
    }
}
