//! Scripted walkthroughs: timed inputs replayed against a shell.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Millis;
use crate::content::ComponentId;
use crate::error::{ExplorerError, Outcome, Result};
use crate::latency::SIMULATION_WINDOW_MS;
use crate::quiz::REVEAL_MS;
use crate::shell::{ExplorerShell, Input, Snapshot, Tab};
use crate::trace::Scenario;
use crate::use_case::CaseKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Offset from the start of the script.
    pub at_ms: Millis,
    pub input: Input,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Script {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
    /// Extra time to run after the last step.
    #[serde(default = "default_tail_ms")]
    pub tail_ms: Millis,
}

fn default_tail_ms() -> Millis {
    1_000
}

/// Longest virtual run a script may describe (one hour).
pub const MAX_SCRIPT_MS: Millis = 60 * 60 * 1_000;

/// One observation emitted while a script runs.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub snapshot: Snapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Input>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScriptReport {
    pub accepted: u32,
    pub ignored: u32,
    pub frames: u32,
    pub ended_at_ms: Millis,
}

fn step(at_ms: Millis, input: Input) -> ScriptStep {
    ScriptStep { at_ms, input }
}

impl Script {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps.windows(2).any(|w| w[1].at_ms < w[0].at_ms) {
            return Err(ExplorerError::InvalidArgument(format!(
                "script {:?}: steps must be ordered by at_ms",
                self.name
            )));
        }
        match self.duration_ms() {
            Some(total) if total <= MAX_SCRIPT_MS => Ok(()),
            _ => Err(ExplorerError::InvalidArgument(format!(
                "script {:?}: runs longer than {MAX_SCRIPT_MS}ms",
                self.name
            ))),
        }
    }

    /// Last step offset plus the tail, `None` on overflow.
    pub fn duration_ms(&self) -> Option<Millis> {
        self.steps
            .last()
            .map_or(0, |s| s.at_ms)
            .checked_add(self.tail_ms)
    }

    /// Visits every tab once.
    pub fn tour() -> Self {
        Self {
            name: "tour".to_string(),
            steps: vec![
                step(0, Input::SimulateGlobalRequest),
                step(3_500, Input::SelectTab { tab: Tab::Mechanics }),
                step(3_500, Input::Trace { scenario: Scenario::Miss }),
                step(9_000, Input::Trace { scenario: Scenario::Hit }),
                step(13_500, Input::SelectTab { tab: Tab::Components }),
                step(13_500, Input::ToggleCard { card: ComponentId::Edge }),
                step(14_000, Input::SelectTab { tab: Tab::TradeOffs }),
                step(14_000, Input::SelectTradeOff { id: "cache".to_string() }),
                step(14_500, Input::SelectTab { tab: Tab::UseCases }),
                step(17_000, Input::SelectUseCase { kind: CaseKind::Gaming }),
                step(30_000, Input::SelectTab { tab: Tab::Quiz }),
                step(30_000, Input::Answer { option: 1 }),
                step(31_000, Input::Answer { option: 2 }),
                step(32_000, Input::Answer { option: 2 }),
            ],
            tail_ms: 1_000,
        }
    }

    /// A single trace of `scenario`, run until it is back to idle.
    pub fn trace(scenario: Scenario) -> Self {
        Self {
            name: format!("trace-{scenario:?}").to_lowercase(),
            steps: vec![
                step(0, Input::SelectTab { tab: Tab::Mechanics }),
                step(0, Input::Trace { scenario }),
            ],
            tail_ms: scenario.total_ms(),
        }
    }

    /// One global request on the concept tab, watched until the window closes.
    pub fn latency() -> Self {
        Self {
            name: "latency".to_string(),
            steps: vec![step(0, Input::SimulateGlobalRequest)],
            tail_ms: SIMULATION_WINDOW_MS,
        }
    }

    /// Run `kind` to completion, optionally switching to another case part way.
    pub fn use_case(kind: CaseKind, switch: Option<(Millis, CaseKind)>) -> Self {
        // Mounting the tab already starts the default case.
        let mut steps = vec![step(0, Input::SelectTab { tab: Tab::UseCases })];
        if kind != CaseKind::default() {
            steps.push(step(0, Input::SelectUseCase { kind }));
        }
        let mut tail_ms = kind.completion_ms();
        if let Some((at_ms, next)) = switch {
            steps.push(step(at_ms, Input::SelectUseCase { kind: next }));
            tail_ms = next.completion_ms();
        }
        Self {
            name: format!("usecase-{}", kind.label()).to_lowercase(),
            steps,
            tail_ms,
        }
    }

    /// Answer each question in turn, one reveal apart.
    pub fn quiz(answers: &[usize]) -> Self {
        let mut steps = vec![step(0, Input::SelectTab { tab: Tab::Quiz })];
        steps.extend(
            answers
                .iter()
                .enumerate()
                .map(|(i, &option)| step(i as Millis * REVEAL_MS, Input::Answer { option })),
        );
        Self {
            name: "quiz".to_string(),
            steps,
            tail_ms: REVEAL_MS,
        }
    }

    /// Replay against `shell`, emitting a frame after each input and every
    /// `frame_ms` of virtual time.
    pub fn run<F>(
        &self,
        shell: &mut ExplorerShell,
        frame_ms: Millis,
        mut on_frame: F,
    ) -> Result<ScriptReport>
    where
        F: FnMut(&Frame),
    {
        self.validate()?;
        let frame_ms = frame_ms.max(1);
        let base = shell.now();
        let end = self
            .duration_ms()
            .and_then(|total| base.checked_add(total))
            .ok_or_else(|| {
                ExplorerError::InvalidArgument(format!(
                    "script {:?} would run past the end of virtual time",
                    self.name
                ))
            })?;

        let mut report = ScriptReport::default();
        let mut steps = self.steps.iter().peekable();

        loop {
            let now = shell.now();
            while let Some(next) = steps.next_if(|s| base.saturating_add(s.at_ms) <= now) {
                let outcome = match shell.dispatch(next.input.clone()) {
                    Ok(o) => o,
                    Err(e) => {
                        warn!(input = ?next.input, error = %e, "script input rejected");
                        return Err(e);
                    }
                };
                match outcome {
                    Outcome::Accepted => report.accepted += 1,
                    Outcome::Ignored => report.ignored += 1,
                }
                report.frames += 1;
                on_frame(&Frame {
                    snapshot: shell.snapshot(),
                    input: Some(next.input.clone()),
                    outcome: Some(outcome),
                });
            }

            if shell.now() >= end && steps.peek().is_none() {
                break;
            }

            let mut target = shell.now().saturating_add(frame_ms).min(end);
            if let Some(next) = steps.peek() {
                target = target.min(base.saturating_add(next.at_ms));
            }
            shell.advance_to(target)?;
            report.frames += 1;
            on_frame(&Frame {
                snapshot: shell.snapshot(),
                input: None,
                outcome: None,
            });
        }

        report.ended_at_ms = shell.now();
        debug!(script = %self.name, ?report, "script finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizPhase;
    use crate::shell::PanelView;
    use crate::trace::TraceStep;

    #[test]
    fn tour_visits_every_tab_and_aces_the_quiz() {
        let mut shell = ExplorerShell::new();
        let mut tabs = Vec::new();
        let report = Script::tour()
            .run(&mut shell, 250, |frame| {
                if tabs.last() != Some(&frame.snapshot.tab) {
                    tabs.push(frame.snapshot.tab);
                }
            })
            .expect("tour runs");

        assert_eq!(tabs, Tab::all().to_vec());
        assert_eq!(report.ended_at_ms, 33_000);
        // The hit trace at 9000 lands after the miss trace finished at 8500.
        assert_eq!(report.ignored, 0);
        match shell.snapshot().view {
            PanelView::Quiz { phase, .. } => {
                assert_eq!(phase, QuizPhase::Complete { score: 3, total: 3 })
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn trace_script_ends_idle() {
        let mut shell = ExplorerShell::new();
        let mut steps = Vec::new();
        Script::trace(Scenario::Miss)
            .run(&mut shell, 500, |frame| {
                if let PanelView::Mechanics { step, .. } = frame.snapshot.view {
                    if steps.last() != Some(&step) {
                        steps.push(step);
                    }
                }
            })
            .expect("trace runs");

        assert_eq!(
            steps,
            vec![
                TraceStep::Idle,
                TraceStep::AtUser,
                TraceStep::AtResolver,
                TraceStep::FetchOrigin,
                TraceStep::Delivered,
                TraceStep::Idle
            ]
        );
        assert_eq!(shell.now(), 5_000);
    }

    #[test]
    fn latency_script_finishes_both_counters() {
        let mut shell = ExplorerShell::new();
        let mut finished_before_close = false;
        let report = Script::latency()
            .run(&mut shell, 50, |frame| {
                if let PanelView::Concept { simulating: true, runs } = &frame.snapshot.view {
                    finished_before_close |= runs.iter().all(|r| r.finished);
                }
            })
            .expect("latency runs");

        assert!(finished_before_close);
        assert_eq!(report.ended_at_ms, SIMULATION_WINDOW_MS);
        match shell.snapshot().view {
            PanelView::Concept { simulating, runs } => {
                assert!(!simulating);
                assert!(runs.iter().all(|r| r.current_latency_ms == 0 && !r.active));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn use_case_switch_restarts_progress() {
        let mut shell = ExplorerShell::new();
        let script = Script::use_case(CaseKind::Streaming, Some((2_000, CaseKind::Gaming)));
        let mut progress_at_switch = None;
        let report = script
            .run(&mut shell, 100, |frame| {
                if let (Some(Input::SelectUseCase { .. }), PanelView::UseCases { run, .. }) =
                    (&frame.input, &frame.snapshot.view)
                {
                    progress_at_switch = Some((run.progress, run.buffering));
                }
            })
            .expect("use case runs");

        assert_eq!(progress_at_switch, Some((0, true)));
        assert_eq!(report.ended_at_ms, 2_000 + CaseKind::Gaming.completion_ms());
        match shell.snapshot().view {
            PanelView::UseCases { run, .. } => {
                assert_eq!(run.case_kind, CaseKind::Gaming);
                assert_eq!(run.progress, 100);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn quiz_script_scores_answers() {
        let mut shell = ExplorerShell::new();
        Script::quiz(&[1, 0, 2]).run(&mut shell, 250, |_| {}).expect("quiz runs");
        assert!(shell.snapshot().to_string().ends_with("complete 2/3"));
    }

    #[test]
    fn scripts_parse_from_json() {
        let json = r#"{
            "name": "double click",
            "steps": [
                {"at_ms": 0, "input": {"type": "select_tab", "tab": "mechanics"}},
                {"at_ms": 0, "input": {"type": "trace", "scenario": "hit"}},
                {"at_ms": 500, "input": {"type": "trace", "scenario": "miss"}}
            ]
        }"#;
        let script = Script::from_json_str(json).expect("valid script");
        assert_eq!(script.tail_ms, 1_000);

        let mut shell = ExplorerShell::new();
        let report = script.run(&mut shell, 100, |_| {}).expect("script runs");
        assert_eq!(report.accepted, 2);
        assert_eq!(report.ignored, 1);
    }

    #[test]
    fn oversized_offsets_are_rejected_not_overflowed() {
        let at_max = r#"{"steps": [
            {"at_ms": 18446744073709551615, "input": {"type": "simulate_global_request"}}
        ]}"#;
        assert!(matches!(
            Script::from_json_str(at_max),
            Err(ExplorerError::InvalidArgument(_))
        ));

        let script = Script {
            name: "too long".to_string(),
            steps: vec![step(MAX_SCRIPT_MS, Input::SimulateGlobalRequest)],
            tail_ms: 1,
        };
        let mut shell = ExplorerShell::new();
        let mut frames = 0;
        assert!(matches!(
            script.run(&mut shell, 50, |_| frames += 1),
            Err(ExplorerError::InvalidArgument(_))
        ));
        assert_eq!(frames, 0);
        assert_eq!(shell.now(), 0);
    }

    #[test]
    fn run_rejects_scripts_that_pass_the_end_of_time() {
        let script = Script {
            name: "late start".to_string(),
            steps: vec![step(0, Input::SimulateGlobalRequest)],
            tail_ms: 1_000,
        };
        let mut shell = ExplorerShell::new();
        shell.advance(Millis::MAX - 10);
        assert!(matches!(
            script.run(&mut shell, 50, |_| {}),
            Err(ExplorerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unordered_steps_are_rejected() {
        let json = r#"{"steps": [
            {"at_ms": 500, "input": {"type": "simulate_global_request"}},
            {"at_ms": 100, "input": {"type": "simulate_global_request"}}
        ]}"#;
        assert!(matches!(
            Script::from_json_str(json),
            Err(ExplorerError::InvalidArgument(_))
        ));
    }
}
