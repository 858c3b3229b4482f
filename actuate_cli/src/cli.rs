//! CLI argument definitions and shared statics.

use actuate_config::Scenario;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "actuate", version, about = "Vehicle actuation controller")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults are used when absent
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Gas lookup CSV (headers: accel,command); overrides longitudinal.gas_lookup
    #[arg(long, value_name = "FILE")]
    pub gas_lookup: Option<PathBuf>,

    /// Brake lookup CSV (headers: accel,command); overrides longitudinal.brake_lookup
    #[arg(long, value_name = "FILE")]
    pub brake_lookup: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace); overrides logging.level, RUST_LOG wins over both
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub const fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            Self::Current
        } else {
            Self::None
        }
    }
}

/// Driving scenario for the simulated vehicle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ScenarioArg {
    Cruise,
    OnePedal,
    LeadStop,
}

impl From<ScenarioArg> for Scenario {
    fn from(s: ScenarioArg) -> Self {
        match s {
            ScenarioArg::Cruise => Self::Cruise,
            ScenarioArg::OnePedal => Self::OnePedal,
            ScenarioArg::LeadStop => Self::LeadStop,
        }
    }
}

/// Real-time knobs shared by commands that drive the loop.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RtArgs {
    /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
    #[arg(
        long,
        action = ArgAction::SetTrue,
        long_help = "Enable real-time mode on supported OSes.\n\nLinux: attempts SCHED_FIFO priority, pins to one CPU and locks the address space with mlockall. This reduces page faults and jitter in the control loop but may require CAP_SYS_NICE, CAP_IPC_LOCK or a raised memlock ulimit.\n\nOther platforms: only memory locking is attempted."
    )]
    pub rt: bool,
    /// SCHED_FIFO priority when --rt is enabled (Linux only); clamped to the system range
    #[arg(long, value_name = "PRIO")]
    pub rt_prio: Option<i32>,
    /// Memory locking mode for --rt (default: current on Linux, none elsewhere)
    #[arg(long, value_enum, value_name = "MODE")]
    pub rt_lock: Option<RtLock>,
    /// CPU index to pin the process to when --rt is enabled (Linux only, default 0)
    #[arg(long, value_name = "CPU")]
    pub rt_cpu: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the controller against the simulated vehicle
    Run {
        /// Scenario to drive (overrides runner.scenario)
        #[arg(long, value_enum)]
        scenario: Option<ScenarioArg>,
        /// Number of control cycles (overrides runner.cycles; 0 = until interrupted)
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// TOML file whose [one_pedal] table is reloaded when it changes
        #[arg(long, value_name = "FILE")]
        tuning: Option<PathBuf>,
        /// Run on simulated time instead of pacing against the wall clock
        #[arg(long, action = ArgAction::SetTrue)]
        fast: bool,
        /// Print loop timing and frame counts
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
        #[command(flatten)]
        rt: RtArgs,
    },
    /// Parse and validate the configuration, then exit
    CheckConfig,
    /// Build the controller and run a short simulated drive
    SelfCheck,
}
