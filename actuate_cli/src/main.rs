//! `actuate`: drive the actuation controller against a simulated vehicle.

mod cli;
mod error_fmt;
mod rt;
mod run;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::{RunRequest, check_config, load_config, print_stats, run_scenario, self_check, summary_json};
use actuate_config::Logging;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

/// Console logs go to stderr; `[logging].file` adds a JSON-lines file sink.
/// The returned guard flushes the file sink when dropped.
fn init_tracing(
    json: bool,
    level: Option<&str>,
    logging: &Logging,
) -> eyre::Result<Option<WorkerGuard>> {
    let level = level.or(logging.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let mut guard = None;
    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                "never" => tracing_appender::rolling::never(dir, name),
                other => eyre::bail!("logging.rotation must be never|daily|hourly, got {other}"),
            };
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))?;
    Ok(guard)
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg = load_config(
        cli.config.as_deref(),
        cli.gas_lookup.as_deref(),
        cli.brake_lookup.as_deref(),
    )?;
    let _log_guard = init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;

    match cli.cmd {
        Commands::Run {
            scenario,
            cycles,
            tuning,
            fast,
            stats,
            rt,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .map_err(|e| eyre::eyre!("install Ctrl-C handler: {e}"))?;

            let req = RunRequest {
                scenario: scenario.map(Into::into),
                cycles,
                tuning,
                fast,
                rt,
            };
            let summary = run_scenario(&cfg, &req, shutdown)?;
            if stats {
                print_stats(&summary);
            }
            if cli.json {
                println!("{}", summary_json(&summary));
            } else {
                println!(
                    "run complete: {} cycles of {}, {} frames, final speed {:.2} m/s, phase {:?}",
                    summary.stats.cycles,
                    run::scenario_name(summary.scenario),
                    summary.stats.frames,
                    summary.final_speed,
                    summary.phase
                );
            }
        }
        Commands::CheckConfig => {
            let report = check_config(&cfg)?;
            if cli.json {
                println!("{report}");
            } else {
                println!("config ok");
            }
        }
        Commands::SelfCheck => {
            let runs = self_check(&cfg)?;
            if cli.json {
                let scenarios: Vec<_> = runs.iter().map(summary_json).collect();
                println!("{}", serde_json::json!({ "self_check": "ok", "scenarios": scenarios }));
            } else {
                for s in &runs {
                    println!(
                        "{:<10} {} cycles, {} frames",
                        run::scenario_name(s.scenario),
                        s.stats.cycles,
                        s.stats.frames
                    );
                }
                println!("self-check ok");
            }
        }
    }
    Ok(())
}
