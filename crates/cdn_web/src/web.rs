use cdn_explorer::content::{ComponentId, COMPONENT_CARDS, PROVIDERS, TRADE_OFFS};
use cdn_explorer::shell::{ExplorerShell, Input, Panel, PanelView, Snapshot, Tab};
use cdn_explorer::trace::{Scenario, TraceNode};
use cdn_explorer::use_case::CaseKind;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_time::Instant;

use crate::ui_model::{
    frame_step, latency_fill, node_class, option_class, progress_width, route_class,
    status_class, tab_icon, FRAME_INTERVAL_MS,
};

#[wasm_bindgen(start)]
pub fn start() {
    mount_to_body(|| view! { <App /> });
}

#[component]
fn App() -> impl IntoView {
    let shell = StoredValue::new(ExplorerShell::new());
    let last_frame = StoredValue::new(Instant::now());

    let (snapshot, set_snapshot) = signal(shell.with_value(|s| s.snapshot()));
    let (status, set_status) = signal(String::new());
    let (interval_id, set_interval_id) = signal::<Option<i32>>(None);

    let refresh = move || set_snapshot.set(shell.with_value(|s| s.snapshot()));

    let do_frame = move || {
        let now = Instant::now();
        let elapsed = last_frame.with_value(|t| now.duration_since(*t).as_secs_f64() * 1_000.0);
        last_frame.set_value(now);
        let step = frame_step(elapsed);
        if step == 0 || shell.with_value(|s| s.is_idle()) {
            return;
        }
        shell.update_value(|s| {
            s.advance(step);
        });
        refresh();
    };

    let dispatch = move |input: Input| {
        let mut result = None;
        shell.update_value(|s| result = Some(s.dispatch(input)));
        match result {
            Some(Err(e)) => set_status.set(e.to_string()),
            _ => set_status.set(String::new()),
        }
        refresh();
    };

    {
        let Some(window) = web_sys::window() else {
            set_status.set("no window".to_string());
            return view! { <p>"no window"</p> }.into_any();
        };
        let cb = Closure::wrap(Box::new(move || do_frame()) as Box<dyn FnMut()>);
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            FRAME_INTERVAL_MS,
        ) {
            Ok(id) => {
                cb.forget();
                set_interval_id.set(Some(id));
            }
            Err(_) => set_status.set("failed to start interval".to_string()),
        }
    }

    on_cleanup(move || {
        if let Some(id) = interval_id.get_untracked() {
            if let Some(w) = web_sys::window() {
                w.clear_interval_with_handle(id);
            }
        }
    });

    let tab_bar = Tab::all()
        .iter()
        .copied()
        .map(|tab| {
            view! {
                <button
                    class=move || if snapshot.get().tab == tab { "tab active" } else { "tab" }
                    on:click=move |_| dispatch(Input::SelectTab { tab })
                >
                    {tab_icon(tab)} " " {tab.label()}
                </button>
            }
        })
        .collect_view();

    view! {
        <main style="font-family: system-ui, -apple-system, Segoe UI, Roboto, sans-serif; padding: 18px; max-width: 960px; margin: 0 auto;">
            <h1 style="margin: 0 0 8px 0;">"How a CDN works"</h1>
            <nav style="display: flex; gap: 8px; flex-wrap: wrap; margin-bottom: 14px;">{tab_bar}</nav>
            <p style="color: #b00; min-height: 1.2em;">{move || status.get()}</p>
            {move || render_panel(snapshot.get(), shell, dispatch)}
        </main>
    }
    .into_any()
}

fn render_panel(
    snap: Snapshot,
    shell: StoredValue<ExplorerShell>,
    dispatch: impl Fn(Input) + Copy + Send + Sync + 'static,
) -> AnyView {
    match snap.view {
        PanelView::Concept { simulating, runs } => {
            let lanes = runs
                .into_iter()
                .map(|run| {
                    view! {
                        <div class="lane">
                            <h3>{run.path.title()} " via " {run.path.serving_node()}</h3>
                            <div class="bar"><div class="fill" style=format!("width: {}%;", latency_fill(&run))></div></div>
                            <span class=status_class(run.status)>
                                {run.current_latency_ms} "ms · " {run.status.label()}
                            </span>
                            <span class=route_class(&run)>
                                {if run.packets_in_flight { "packets in flight" } else { "" }}
                            </span>
                        </div>
                    }
                })
                .collect_view();
            let label = if simulating {
                "Simulating Traffic..."
            } else {
                "Simulate Global Request"
            };
            view! {
                <section>
                    <button disabled=simulating on:click=move |_| dispatch(Input::SimulateGlobalRequest)>
                        {label}
                    </button>
                    {lanes}
                </section>
            }
            .into_any()
        }
        PanelView::Mechanics { step, animating, edge_badge, caption, .. } => {
            let lit = |node: TraceNode| {
                shell.with_value(|s| match s.panel() {
                    Panel::Mechanics(t) => t.node_lit(node),
                    _ => false,
                })
            };
            let origin_shown = shell.with_value(|s| match s.panel() {
                Panel::Mechanics(t) => t.origin_shown(),
                _ => false,
            });
            let nodes = [TraceNode::User, TraceNode::Resolver, TraceNode::Edge]
                .into_iter()
                .chain(origin_shown.then_some(TraceNode::Origin))
                .map(|node| view! { <div class=node_class(lit(node))>{format!("{node:?}")}</div> })
                .collect_view();
            let buttons = [Scenario::Hit, Scenario::Miss]
                .into_iter()
                .map(|scenario| {
                    view! {
                        <button disabled=animating on:click=move |_| dispatch(Input::Trace { scenario })>
                            {scenario.button_label()}
                        </button>
                    }
                })
                .collect_view();
            view! {
                <section>
                    <div style="display: flex; gap: 8px;">{buttons}</div>
                    <div class="trace">{nodes}</div>
                    <p class="badge">{edge_badge.map(|b| b.label())}</p>
                    <p>"Step " {step.index()} ": " {caption}</p>
                </section>
            }
            .into_any()
        }
        PanelView::Components { open } => {
            let cards = COMPONENT_CARDS
                .iter()
                .map(|card| {
                    let id: ComponentId = card.id;
                    let details = (open == Some(id)).then(|| {
                        let items = card
                            .details
                            .iter()
                            .map(|d| view! { <li>{*d}</li> })
                            .collect_view();
                        view! {
                            <div>
                                <p>{card.description}</p>
                                <ul>{items}</ul>
                            </div>
                        }
                    });
                    view! {
                        <article class="card" on:click=move |_| dispatch(Input::ToggleCard { card: id })>
                            <h3>{card.title}</h3>
                            <p><em>{card.role}</em></p>
                            {details}
                        </article>
                    }
                })
                .collect_view();
            view! { <section>{cards}</section> }.into_any()
        }
        PanelView::TradeOffs { selected } => {
            let items = TRADE_OFFS
                .iter()
                .map(|t| {
                    let id = t.id;
                    let chosen = selected.map(|(s, _)| s) == Some(id);
                    view! {
                        <li class=if chosen { "trade-off selected" } else { "trade-off" }
                            on:click=move |_| dispatch(Input::SelectTradeOff { id: id.to_string() })>
                            {format!("{:?}", t.side)} ": " {t.label}
                        </li>
                    }
                })
                .collect_view();
            let detail = selected
                .and_then(|(id, _)| TRADE_OFFS.iter().find(|t| t.id == id))
                .map(|t| t.text);
            view! {
                <section>
                    <ul>{items}</ul>
                    <p>{detail}</p>
                </section>
            }
            .into_any()
        }
        PanelView::UseCases { run, ping_ms, throughput, link } => {
            let buttons = CaseKind::all()
                .iter()
                .copied()
                .map(|kind| {
                    view! {
                        <button
                            class=if kind == run.case_kind { "case active" } else { "case" }
                            on:click=move |_| dispatch(Input::SelectUseCase { kind })
                        >
                            {kind.label()}
                        </button>
                    }
                })
                .collect_view();
            view! {
                <section>
                    <div style="display: flex; gap: 8px;">{buttons}</div>
                    <p>{run.case_kind.caption()}</p>
                    <div class="bar"><div class="fill" style=progress_width(run.progress)></div></div>
                    <p>{if run.buffering { "Buffering..." } else { "Playing" }}</p>
                    <p>{link}</p>
                    <p>"Ping: " {ping_ms} "ms · Throughput: " {throughput}</p>
                </section>
            }
            .into_any()
        }
        PanelView::Quiz { state, .. } => {
            let question = shell.with_value(|s| match s.panel() {
                Panel::Quiz(q) => q.current().cloned().map(|question| {
                    let feedback: Vec<_> = (0..question.options.len())
                        .map(|i| q.option_feedback(i))
                        .collect();
                    (question, feedback, q.total())
                }),
                _ => None,
            });
            let providers = PROVIDERS
                .iter()
                .map(|p| view! { <li><strong>{p.name}</strong> " " {p.description}</li> })
                .collect_view();
            let body = match question {
                Some((question, feedback, total)) => {
                    let options = question
                        .options
                        .into_iter()
                        .zip(feedback)
                        .enumerate()
                        .map(|(option, (text, fb))| {
                            view! {
                                <button class=option_class(fb) on:click=move |_| dispatch(Input::Answer { option })>
                                    {text}
                                </button>
                            }
                        })
                        .collect_view();
                    view! {
                        <section>
                            <p>"Question " {state.current_question_index + 1} " of " {total}</p>
                            <h3>{question.prompt}</h3>
                            <div style="display: grid; gap: 8px;">{options}</div>
                        </section>
                    }
                    .into_any()
                }
                None => view! {
                    <section>
                        <h3>"Quiz complete"</h3>
                        <p>"Score: " {state.score}</p>
                        <button on:click=move |_| dispatch(Input::ResetQuiz)>"Retake Quiz"</button>
                    </section>
                }
                .into_any(),
            };
            view! {
                <div>
                    {body}
                    <aside>
                        <h4>"Major CDN providers"</h4>
                        <ul>{providers}</ul>
                    </aside>
                </div>
            }
            .into_any()
        }
    }
}
