//! Terminal driver for the CDN explorer.
//!
//! Examples:
//!   cdn-explorer latency
//!   cdn-explorer trace miss
//!   cdn-explorer usecase gaming --switch 2000 updates
//!   cdn-explorer quiz 1 2 2
//!   cdn-explorer --json tour
//!   cdn-explorer --realtime run walkthrough.json
//!
//! Frames are printed one per line; `--json` prints them as JSON lines.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cdn_explorer::clock::Millis;
use cdn_explorer::config::{AppPaths, ExplorerConfig};
use cdn_explorer::error::Result;
use cdn_explorer::script::{Frame, Script};
use cdn_explorer::shell::ExplorerShell;
use cdn_explorer::trace::Scenario;
use cdn_explorer::use_case::CaseKind;

fn usage() -> ! {
    eprintln!("cdn-explorer (virtual-time CDN explainer)");
    eprintln!("Usage: cdn-explorer [--config file] [--json] [--realtime] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  latency                              Legacy vs optimized latency race");
    eprintln!("  trace <hit|miss>                     Step through one request");
    eprintln!("  usecase <kind> [--switch <ms> <kind>]  streaming|gaming|updates progress");
    eprintln!("  quiz <answer>...                     Answer the quiz (option indices)");
    eprintln!("  tour                                 Visit every tab");
    eprintln!("  run <script.json>                    Replay a scripted walkthrough");
    eprintln!("  paths                                Show the config file location");
    process::exit(1);
}

struct Cli {
    config: Option<PathBuf>,
    json: bool,
    realtime: bool,
    args: Vec<String>,
}

fn parse_args() -> Cli {
    let mut cli = Cli {
        config: None,
        json: false,
        realtime: false,
        args: Vec::new(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => match it.next() {
                Some(path) => cli.config = Some(PathBuf::from(path)),
                None => usage(),
            },
            "--json" => cli.json = true,
            "--realtime" => cli.realtime = true,
            "-h" | "--help" | "help" => usage(),
            _ => cli.args.push(arg),
        }
    }
    if cli.args.is_empty() {
        usage();
    }
    cli
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    process::exit(2);
}

fn script_for(args: &[String]) -> Result<Script> {
    let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or_else(|| usage());
    match args[0].as_str() {
        "latency" => Ok(Script::latency()),
        "trace" => Ok(Script::trace(Scenario::parse(arg(1))?)),
        "usecase" => {
            let kind = CaseKind::parse(arg(1))?;
            let switch = match args.get(2).map(String::as_str) {
                None => None,
                Some("--switch") => {
                    let at: Millis = arg(3)
                        .parse()
                        .unwrap_or_else(|_| fail("--switch needs a time in milliseconds"));
                    Some((at, CaseKind::parse(arg(4))?))
                }
                Some(_) => usage(),
            };
            Ok(Script::use_case(kind, switch))
        }
        "quiz" => {
            let answers = args[1..]
                .iter()
                .map(|a| {
                    a.parse::<usize>().unwrap_or_else(|_| {
                        fail(format!("quiz answers must be option indices, got {a:?}"))
                    })
                })
                .collect::<Vec<_>>();
            if answers.is_empty() {
                usage();
            }
            Ok(Script::quiz(&answers))
        }
        "tour" => Ok(Script::tour()),
        "run" => Script::load(std::path::Path::new(arg(1))),
        other => fail(format!("Unknown command: {other}")),
    }
}

fn print_frame(frame: &Frame, json: bool) {
    if json {
        match serde_json::to_string(frame) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("frame not serializable: {e}"),
        }
        return;
    }
    match (&frame.input, frame.outcome) {
        (Some(input), Some(outcome)) => println!("{}  <- {input:?} ({outcome:?})", frame.snapshot),
        _ => println!("{}", frame.snapshot),
    }
}

/// Print frames spaced by their virtual timestamps, scaled by `speed`.
async fn replay_realtime(frames: &[Frame], speed: f32, json: bool) {
    let mut last = frames.first().map(|f| f.snapshot.at_ms).unwrap_or(0);
    for frame in frames {
        let gap = frame.snapshot.at_ms.saturating_sub(last);
        if gap > 0 {
            let wall = Duration::from_secs_f64(gap as f64 / 1_000.0 / f64::from(speed));
            tokio::time::sleep(wall).await;
        }
        last = frame.snapshot.at_ms;
        print_frame(frame, json);
    }
}

async fn run(cli: Cli, cfg: ExplorerConfig) -> Result<()> {
    if cli.args[0] == "paths" {
        let paths = AppPaths::new()?;
        println!("Config directory: {}", paths.config_dir().display());
        println!("Config file: {}", paths.config_file().display());
        return Ok(());
    }

    let script = script_for(&cli.args)?;
    let json = cli.json || cfg.json;
    let realtime = cli.realtime || cfg.realtime;
    let mut shell = ExplorerShell::with_bank(cfg.question_bank()?);
    info!(script = %script.name, frame_ms = cfg.frame_ms, realtime, "running script");

    let report = if realtime {
        let mut frames = Vec::new();
        let report = script.run(&mut shell, cfg.frame_ms, |f| frames.push(f.clone()))?;
        replay_realtime(&frames, cfg.speed, json).await;
        report
    } else {
        script.run(&mut shell, cfg.frame_ms, |f| print_frame(f, json))?
    };

    info!(
        accepted = report.accepted,
        ignored = report.ignored,
        frames = report.frames,
        ended_at_ms = report.ended_at_ms,
        "script complete"
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = parse_args();

    let cfg = match ExplorerConfig::resolve(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => fail(format!("config: {e}")),
    };

    // Logs go to stderr so frames on stdout stay machine-readable.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, cfg).await {
        error!("{e}");
        process::exit(1);
    }
}
