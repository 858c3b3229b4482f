//! Config loading and the simulated-vehicle commands: run, check-config, self-check.

use crate::cli::RtArgs;
use crate::rt::{RtReport, setup_rt_once};
use actuate_config::{Config, Scenario};
use actuate_core::error::ControllerError;
use actuate_core::{Controller, OnePedalTuning, RunOptions, RunStats, StandstillPhase, TuningFile};
use actuate_traits::{Clock, ManualClock, MonotonicClock, TuningSource};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Cycles driven per scenario by `self-check`.
const SELF_CHECK_CYCLES: u64 = 200;

fn config_error(msg: impl std::fmt::Display) -> eyre::Report {
    eyre::Report::new(ControllerError::Config(msg.to_string()))
}

/// Load the config (or defaults), apply lookup CSV overrides and validate.
pub fn load_config(
    path: Option<&Path>,
    gas_lookup: Option<&Path>,
    brake_lookup: Option<&Path>,
) -> eyre::Result<Config> {
    let mut cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| config_error(format!("read {}: {e}", p.display())))?;
            actuate_config::load_toml(&text)
                .map_err(|e| config_error(format!("parse {}: {e}", p.display())))?
        }
        None => Config::default(),
    };
    if let Some(p) = gas_lookup {
        cfg.longitudinal.gas_lookup = actuate_config::load_lookup_csv(p).map_err(config_error)?;
    }
    if let Some(p) = brake_lookup {
        cfg.longitudinal.brake_lookup =
            actuate_config::load_lookup_csv(p).map_err(config_error)?;
    }
    cfg.validate().map_err(config_error)?;
    Ok(cfg)
}

/// What `actuate run` was asked to do.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub scenario: Option<Scenario>,
    pub cycles: Option<u64>,
    pub tuning: Option<PathBuf>,
    pub fast: bool,
    pub rt: RtArgs,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub scenario: Scenario,
    pub stats: RunStats,
    pub final_speed: f32,
    pub odometer: f64,
    pub phase: StandstillPhase,
    pub frames_by_name: BTreeMap<&'static str, u64>,
    pub rt: RtReport,
}

pub fn scenario_name(s: Scenario) -> &'static str {
    match s {
        Scenario::Cruise => "cruise",
        Scenario::OnePedal => "one-pedal",
        Scenario::LeadStop => "lead-stop",
    }
}

pub fn run_scenario(
    cfg: &Config,
    req: &RunRequest,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    let rt = setup_rt_once(&req.rt);

    let mut controller = Controller::builder().with_config(cfg)?.build()?;
    let scenario = req.scenario.unwrap_or(cfg.runner.scenario);
    let cycles = req.cycles.unwrap_or(cfg.runner.cycles);
    let (mut source, mut bus, plant) = actuate_sim::rig(scenario, controller.params());

    let mut tuning_file = req.tuning.as_deref().map(TuningFile::new);
    let tuning = tuning_file
        .as_mut()
        .map(|t| t as &mut dyn TuningSource<OnePedalTuning>);

    let clock: Box<dyn Clock> = if req.fast {
        Box::new(ManualClock::new())
    } else {
        Box::new(MonotonicClock::new())
    };
    let opts = RunOptions {
        rate_hz: cfg.runner.rate_hz,
        max_cycles: (cycles > 0).then_some(cycles),
        shutdown: Some(shutdown),
    };

    tracing::info!(
        scenario = scenario_name(scenario),
        cycles,
        fast = req.fast,
        "starting simulated drive"
    );
    let stats = actuate_core::run(
        &mut controller,
        &mut source,
        &mut bus,
        tuning,
        clock.as_ref(),
        &opts,
    )?;

    let p = plant.borrow();
    Ok(RunSummary {
        scenario,
        final_speed: p.v,
        odometer: p.odometer,
        phase: controller.phase(),
        frames_by_name: bus.counts().clone(),
        stats,
        rt,
    })
}

pub fn summary_json(s: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "scenario": scenario_name(s.scenario),
        "cycles": s.stats.cycles,
        "frames": s.stats.frames,
        "frames_by_name": s.frames_by_name,
        "final_speed": s.final_speed,
        "odometer": s.odometer,
        "phase": format!("{:?}", s.phase),
        "missed_deadlines": s.stats.missed_deadlines,
        "mean_cycle_us": s.stats.mean_cycle_us(),
        "max_cycle_us": s.stats.max_cycle_us,
        "reloads": s.stats.reloads,
        "reload_failures": s.stats.reload_failures,
        "steer_rate_limited": s.stats.steer_rate_limited,
        "rt": {
            "mem_lock": s.rt.mem_lock.map(|l| format!("{l:?}").to_ascii_lowercase()),
            "fifo_prio": s.rt.fifo_prio,
            "cpu": s.rt.cpu,
        },
    })
}

pub fn print_stats(s: &RunSummary) {
    let st = &s.stats;
    eprintln!(
        "Stats: cycles={}, frames={}, missed_deadlines={}",
        st.cycles, st.frames, st.missed_deadlines
    );
    eprintln!(
        "Cycle time (us): mean={}, max={}",
        st.mean_cycle_us(),
        st.max_cycle_us
    );
    eprintln!(
        "Tuning: reloads={}, refused={}",
        st.reloads, st.reload_failures
    );
    eprintln!("Steering: rate_limited={}", st.steer_rate_limited);
    for (name, n) in &s.frames_by_name {
        eprintln!("  {name:<18} {n}");
    }
}

/// Build the controller from `cfg` and report the effective settings.
pub fn check_config(cfg: &Config) -> eyre::Result<serde_json::Value> {
    let controller = Controller::builder().with_config(cfg)?.build()?;
    let p = controller.params();
    Ok(serde_json::json!({
        "config": "ok",
        "scenario": scenario_name(cfg.runner.scenario),
        "rate_hz": cfg.runner.rate_hz,
        "cycles": cfg.runner.cycles,
        "steer_max": p.steer.max,
        "max_brake": p.long.max_brake,
        "one_pedal_floor": controller.tuning().max_decel,
    }))
}

/// Drive every scenario for a short while on simulated time.
pub fn self_check(cfg: &Config) -> eyre::Result<Vec<RunSummary>> {
    [Scenario::Cruise, Scenario::OnePedal, Scenario::LeadStop]
        .into_iter()
        .map(|scenario| {
            let req = RunRequest {
                scenario: Some(scenario),
                cycles: Some(SELF_CHECK_CYCLES),
                tuning: None,
                fast: true,
                rt: RtArgs::default(),
            };
            let summary = run_scenario(cfg, &req, Arc::new(AtomicBool::new(false)))?;
            if summary.stats.cycles != SELF_CHECK_CYCLES || summary.stats.frames == 0 {
                eyre::bail!(
                    "{} drive stopped early after {} cycles",
                    scenario_name(scenario),
                    summary.stats.cycles
                );
            }
            tracing::debug!(scenario = scenario_name(scenario), "self-check scenario ok");
            Ok(summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = load_config(None, None, None).expect("defaults");
        assert_eq!(cfg.runner.rate_hz, 100);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/actuate.toml")), None, None)
            .expect_err("missing");
        assert!(matches!(
            err.downcast_ref::<ControllerError>(),
            Some(ControllerError::Config(_))
        ));
    }

    #[test]
    fn fast_lead_stop_run_comes_to_rest() {
        let cfg = Config::default();
        let req = RunRequest {
            scenario: Some(Scenario::LeadStop),
            cycles: Some(2500),
            tuning: None,
            fast: true,
            rt: RtArgs::default(),
        };
        let s = run_scenario(&cfg, &req, Arc::new(AtomicBool::new(false))).expect("run");
        assert_eq!(s.stats.cycles, 2500);
        assert!(s.final_speed <= 0.0);
        assert_eq!(s.phase, StandstillPhase::FullStop);
        let v = summary_json(&s);
        assert_eq!(v["scenario"], "lead-stop");
        assert_eq!(v["cycles"], 2500);
    }

    #[test]
    fn self_check_drives_every_scenario() {
        let out = self_check(&Config::default()).expect("self-check");
        assert_eq!(out.len(), 3);
    }
}
