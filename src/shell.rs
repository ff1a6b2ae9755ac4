//! View shell: tab selection, panel lifetime and input routing.
//!
//! Exactly one panel is mounted at a time. Switching tabs cancels the mounted
//! panel's timers before it is dropped, so nothing scheduled by a disposed panel
//! can fire later.

use std::fmt;

use tracing::{debug, info};

use crate::clock::{Animated, Millis, VirtualClock};
use crate::content::{ComponentId, QuestionBank, TradeOffSide};
use crate::error::{ExplorerError, Outcome, Result};
use crate::explore::{CardExplorer, TradeOffBoard};
use crate::latency::{LatencyComparison, PathKind, SimulationRun};
use crate::quiz::{Quiz, QuizPhase, QuizState};
use crate::trace::{EdgeBadge, RequestTrace, Scenario, TraceStep};
use crate::use_case::{CaseKind, UseCaseRun, UseCaseSimulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Tab {
    #[default]
    Concept,
    Mechanics,
    Components,
    TradeOffs,
    UseCases,
    Quiz,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::Concept => "What is a CDN?",
            Tab::Mechanics => "How It Works",
            Tab::Components => "Components",
            Tab::TradeOffs => "Pros & Cons",
            Tab::UseCases => "Use Cases",
            Tab::Quiz => "Quiz",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Tab::Concept => "concept",
            Tab::Mechanics => "mechanics",
            Tab::Components => "components",
            Tab::TradeOffs => "trade_offs",
            Tab::UseCases => "use_cases",
            Tab::Quiz => "quiz",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        Tab::all()
            .iter()
            .copied()
            .find(|t| t.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| ExplorerError::InvalidArgument(format!("unknown tab {s:?}")))
    }

    pub fn all() -> &'static [Tab] {
        &[
            Tab::Concept,
            Tab::Mechanics,
            Tab::Components,
            Tab::TradeOffs,
            Tab::UseCases,
            Tab::Quiz,
        ]
    }
}

/// Every user action the explorer understands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Input {
    SelectTab { tab: Tab },
    SimulateGlobalRequest,
    Trace { scenario: Scenario },
    ToggleCard { card: ComponentId },
    SelectTradeOff { id: String },
    SelectUseCase { kind: CaseKind },
    Answer { option: usize },
    ResetQuiz,
}

impl Input {
    /// Tab whose panel handles this input (`None` for shell-level inputs).
    pub fn target(&self) -> Option<Tab> {
        match self {
            Input::SelectTab { .. } => None,
            Input::SimulateGlobalRequest => Some(Tab::Concept),
            Input::Trace { .. } => Some(Tab::Mechanics),
            Input::ToggleCard { .. } => Some(Tab::Components),
            Input::SelectTradeOff { .. } => Some(Tab::TradeOffs),
            Input::SelectUseCase { .. } => Some(Tab::UseCases),
            Input::Answer { .. } | Input::ResetQuiz => Some(Tab::Quiz),
        }
    }
}

/// The mounted panel and its local state.
#[derive(Debug)]
pub enum Panel {
    Concept(LatencyComparison),
    Mechanics(RequestTrace),
    Components(CardExplorer),
    TradeOffs(TradeOffBoard),
    UseCases(UseCaseSimulator),
    Quiz(Quiz),
}

impl Panel {
    fn mount(tab: Tab, now: Millis, bank: &QuestionBank) -> Result<Self> {
        Ok(match tab {
            Tab::Concept => Panel::Concept(LatencyComparison::new()),
            Tab::Mechanics => Panel::Mechanics(RequestTrace::new()),
            Tab::Components => Panel::Components(CardExplorer::new()),
            Tab::TradeOffs => Panel::TradeOffs(TradeOffBoard::new()),
            Tab::UseCases => {
                let mut sim = UseCaseSimulator::new();
                sim.mount(now)?;
                Panel::UseCases(sim)
            }
            Tab::Quiz => Panel::Quiz(Quiz::new(bank.clone())),
        })
    }

    pub fn tab(&self) -> Tab {
        match self {
            Panel::Concept(_) => Tab::Concept,
            Panel::Mechanics(_) => Tab::Mechanics,
            Panel::Components(_) => Tab::Components,
            Panel::TradeOffs(_) => Tab::TradeOffs,
            Panel::UseCases(_) => Tab::UseCases,
            Panel::Quiz(_) => Tab::Quiz,
        }
    }

    fn animated(&self) -> Option<&dyn Animated> {
        match self {
            Panel::Concept(p) => Some(p as &dyn Animated),
            Panel::Mechanics(p) => Some(p as &dyn Animated),
            Panel::UseCases(p) => Some(p as &dyn Animated),
            Panel::Quiz(p) => Some(p as &dyn Animated),
            Panel::Components(_) | Panel::TradeOffs(_) => None,
        }
    }

    fn animated_mut(&mut self) -> Option<&mut dyn Animated> {
        match self {
            Panel::Concept(p) => Some(p as &mut dyn Animated),
            Panel::Mechanics(p) => Some(p as &mut dyn Animated),
            Panel::UseCases(p) => Some(p as &mut dyn Animated),
            Panel::Quiz(p) => Some(p as &mut dyn Animated),
            Panel::Components(_) | Panel::TradeOffs(_) => None,
        }
    }

    fn dispose(&mut self) {
        if let Some(anim) = self.animated_mut() {
            anim.cancel();
        }
    }

    pub fn view(&self) -> PanelView {
        match self {
            Panel::Concept(p) => PanelView::Concept {
                simulating: p.is_simulating(),
                runs: PathKind::all().iter().map(|&k| p.counter(k).run()).collect(),
            },
            Panel::Mechanics(p) => PanelView::Mechanics {
                scenario: p.scenario(),
                step: p.step(),
                animating: p.is_animating(),
                edge_badge: p.edge_badge(),
                caption: p.caption(),
            },
            Panel::Components(p) => PanelView::Components {
                open: p.open_card().map(|c| c.id),
            },
            Panel::TradeOffs(p) => PanelView::TradeOffs {
                selected: p.selected().map(|t| (t.id, t.side)),
            },
            Panel::UseCases(p) => PanelView::UseCases {
                run: p.run(),
                ping_ms: p.ping_ms(),
                throughput: p.throughput_label(),
                link: p.link_status(),
            },
            Panel::Quiz(p) => PanelView::Quiz {
                state: p.state(),
                phase: p.phase(),
            },
        }
    }
}

/// Rendered state of the mounted panel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "panel", rename_all = "snake_case"))]
pub enum PanelView {
    Concept {
        simulating: bool,
        runs: Vec<SimulationRun>,
    },
    Mechanics {
        scenario: Scenario,
        step: TraceStep,
        animating: bool,
        edge_badge: Option<EdgeBadge>,
        caption: &'static str,
    },
    Components {
        open: Option<ComponentId>,
    },
    TradeOffs {
        selected: Option<(&'static str, TradeOffSide)>,
    },
    UseCases {
        run: UseCaseRun,
        ping_ms: u32,
        throughput: &'static str,
        link: &'static str,
    },
    Quiz {
        state: QuizState,
        phase: QuizPhase,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot {
    pub at_ms: Millis,
    pub tab: Tab,
    pub view: PanelView,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>6}ms] {:<14} ", self.at_ms, self.tab.label())?;
        match &self.view {
            PanelView::Concept { simulating, runs } => {
                write!(f, "simulating={simulating}")?;
                for r in runs {
                    write!(
                        f,
                        " | {:?} {}ms {}",
                        r.path,
                        r.current_latency_ms,
                        r.status.label()
                    )?;
                }
                Ok(())
            }
            PanelView::Mechanics {
                scenario,
                step,
                animating,
                edge_badge,
                caption,
            } => {
                write!(f, "{scenario:?} step={} ({step:?})", step.index())?;
                if let Some(badge) = edge_badge {
                    write!(f, " [{}]", badge.label())?;
                }
                if *animating {
                    write!(f, " {caption}")
                } else {
                    write!(f, " idle")
                }
            }
            PanelView::Components { open } => match open {
                Some(id) => write!(f, "open={id:?}"),
                None => write!(f, "no card open"),
            },
            PanelView::TradeOffs { selected } => match selected {
                Some((id, side)) => write!(f, "selected={id} ({side:?})"),
                None => write!(f, "nothing selected"),
            },
            PanelView::UseCases {
                run,
                ping_ms,
                throughput,
                ..
            } => write!(
                f,
                "{:?} progress={}% buffering={} ping={ping_ms}ms {throughput}",
                run.case_kind, run.progress, run.buffering
            ),
            PanelView::Quiz { state, phase } => match phase {
                QuizPhase::Complete { score, total } => write!(f, "complete {score}/{total}"),
                _ => write!(
                    f,
                    "question {} score={} selected={:?}",
                    state.current_question_index + 1,
                    state.score,
                    state.selected_option
                ),
            },
        }
    }
}

#[derive(Debug)]
pub struct ExplorerShell {
    clock: VirtualClock,
    bank: QuestionBank,
    panel: Panel,
}

impl Default for ExplorerShell {
    fn default() -> Self {
        Self::with_bank(QuestionBank::builtin())
    }
}

impl ExplorerShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bank(bank: QuestionBank) -> Self {
        Self {
            clock: VirtualClock::new(),
            bank,
            panel: Panel::Concept(LatencyComparison::new()),
        }
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    pub fn active_tab(&self) -> Tab {
        self.panel.tab()
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Dispose the mounted panel and mount a fresh one for `tab`.
    pub fn select_tab(&mut self, tab: Tab) -> Result<Outcome> {
        if tab == self.active_tab() {
            return Ok(Outcome::Ignored);
        }
        let next = Panel::mount(tab, self.now(), &self.bank)?;
        self.panel.dispose();
        self.panel = next;
        info!(tab = tab.key(), now = self.now(), "tab selected");
        Ok(Outcome::Accepted)
    }

    pub fn dispatch(&mut self, input: Input) -> Result<Outcome> {
        let now = self.now();
        if let Some(target) = input.target() {
            if target != self.active_tab() {
                return Err(ExplorerError::InvalidArgument(format!(
                    "{input:?} needs the {} tab (active: {})",
                    target.key(),
                    self.active_tab().key()
                )));
            }
        }
        debug!(?input, now, "dispatch");

        if let Input::SelectTab { tab } = input {
            return self.select_tab(tab);
        }
        match (input, &mut self.panel) {
            (Input::SimulateGlobalRequest, Panel::Concept(p)) => p.trigger(now),
            (Input::Trace { scenario }, Panel::Mechanics(p)) => p.trigger(now, scenario),
            (Input::ToggleCard { card }, Panel::Components(p)) => {
                p.toggle(card);
                Ok(Outcome::Accepted)
            }
            (Input::SelectTradeOff { id }, Panel::TradeOffs(p)) => {
                p.select(&id)?;
                Ok(Outcome::Accepted)
            }
            (Input::SelectUseCase { kind }, Panel::UseCases(p)) => p.select(now, kind),
            (Input::Answer { option }, Panel::Quiz(p)) => p.submit(now, option),
            (Input::ResetQuiz, Panel::Quiz(p)) => Ok(p.reset()),
            (input, panel) => Err(ExplorerError::InvalidArgument(format!(
                "{input:?} cannot be handled by the {} panel",
                panel.tab().key()
            ))),
        }
    }

    /// Move virtual time forward and let the mounted panel catch up.
    pub fn advance(&mut self, by: Millis) -> Millis {
        let now = self.clock.advance(by);
        if let Some(anim) = self.panel.animated_mut() {
            anim.advance_to(now);
        }
        now
    }

    pub fn advance_to(&mut self, t: Millis) -> Result<Millis> {
        let now = self.clock.advance_to(t)?;
        if let Some(anim) = self.panel.animated_mut() {
            anim.advance_to(now);
        }
        Ok(now)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.panel.animated().and_then(|a| a.next_deadline())
    }

    /// No run in flight on the mounted panel.
    pub fn is_idle(&self) -> bool {
        !self.panel.animated().is_some_and(|a| a.is_active())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            at_ms: self.now(),
            tab: self.active_tab(),
            view: self.panel.view(),
        }
    }
}
