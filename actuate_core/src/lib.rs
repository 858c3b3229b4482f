#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::float_cmp
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Vehicle actuation engine (transport-agnostic).
//!
//! Each 10 ms control cycle turns a planner's acceleration and steering
//! request into typed bus commands for a GM-style car. All I/O goes through
//! the `actuate_traits` seams: `InputSource`, `Transport`, `TuningSource`
//! and `Clock`.
//!
//! ## Architecture
//!
//! - **Steering** (`steering`): torque limiter and echo-counter sequencing
//! - **Longitudinal** (`longitudinal`): baseline gas/brake mapping, one-pedal
//!   loop, lead lockout and coasting policies
//! - **Standstill** (`standstill`): near-stop / full-stop / auto-hold phases
//! - **Scheduling** (`scheduler`): per-kind periods and rolling counters
//! - **HUD** (`hud`): brake percentage indicator
//! - **Host loop** (`runner`): pacing, stats and tuning reload
//!
//! The control path never fails. Configuration problems surface as
//! `BuildError` when the `Controller` is built or reloaded.

pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod curve;
pub mod error;
pub mod hud;
pub mod longitudinal;
pub mod mocks;
pub mod pid;
pub mod runner;
pub mod scheduler;
pub mod standstill;
pub mod state;
pub mod steering;
pub mod tuning;
pub mod util;

pub use command::{CanBus, CanCommand, Message};
pub use config::{ControllerParams, LongitudinalParams, OnePedalTuning, SchedulePeriods, SteerLimits};
pub use controller::{Controller, ControllerBuilder};
pub use curve::{Curve, CurveError};
pub use error::{BuildError, ControllerError, Result};
pub use runner::{CycleInput, RunOptions, RunStats, run};
pub use standstill::StandstillPhase;
pub use state::{
    ActuatorRequest, DriveMode, Feedback, Gear, HudParams, Lead, PlanSource, VehicleState,
    VisualAlert,
};
pub use tuning::TuningFile;
