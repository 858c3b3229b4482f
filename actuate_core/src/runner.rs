//! Host loop: pace cycles with a `Clock`, pull inputs, run the controller,
//! hand frames to the transport and poll for tuning on its cadence.

use crate::command::{CanCommand, Message};
use crate::config::OnePedalTuning;
use crate::controller::Controller;
use crate::error::{ControllerError, Result};
use crate::state::{ActuatorRequest, Feedback, HudParams, VehicleState};
use actuate_traits::{Clock, InputSource, Transport, TuningSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// One cycle of external inputs.
#[derive(Debug, Clone, Default)]
pub struct CycleInput {
    pub engaged: bool,
    pub state: VehicleState,
    pub request: ActuatorRequest,
    pub hud: HudParams,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub rate_hz: u32,
    /// Stop after this many cycles; `None` runs until the source is exhausted.
    pub max_cycles: Option<u64>,
    /// Set from outside (e.g. a signal handler) to stop between cycles.
    pub shutdown: Option<Arc<AtomicBool>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            rate_hz: 100,
            max_cycles: None,
            shutdown: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub frames: u64,
    pub missed_deadlines: u64,
    pub max_cycle_us: u64,
    pub total_cycle_us: u64,
    pub reloads: u64,
    pub reload_failures: u64,
    /// Active steering frames whose torque the limiter cut back.
    pub steer_rate_limited: u64,
}

impl RunStats {
    pub fn mean_cycle_us(&self) -> u64 {
        self.total_cycle_us.checked_div(self.cycles).unwrap_or(0)
    }
}

#[inline]
fn interrupted(opts: &RunOptions) -> bool {
    opts.shutdown
        .as_ref()
        .is_some_and(|f| f.load(Ordering::Relaxed))
}

fn poll_tuning(
    controller: &mut Controller,
    src: &mut dyn TuningSource<OnePedalTuning>,
    stats: &mut RunStats,
) {
    match src.poll() {
        Ok(Some(t)) => match controller.reload(t) {
            Ok(()) => stats.reloads += 1,
            Err(_) => stats.reload_failures += 1,
        },
        Ok(None) => {}
        Err(e) => {
            stats.reload_failures += 1;
            tracing::warn!(error = %ControllerError::Tuning(e.to_string()), "tuning poll failed");
        }
    }
}

/// Run until the source is exhausted, `max_cycles` is reached, or shutdown
/// is requested (reported as `ControllerError::Interrupted`).
///
/// Feedback written by the controller is carried into the next cycle's
/// state, since the source produces a fresh snapshot every cycle.
pub fn run<S, T, C>(
    controller: &mut Controller,
    source: &mut S,
    transport: &mut T,
    mut tuning: Option<&mut dyn TuningSource<OnePedalTuning>>,
    clock: &C,
    opts: &RunOptions,
) -> Result<RunStats>
where
    S: InputSource<CycleInput> + ?Sized,
    T: Transport<CanCommand> + ?Sized,
    C: Clock + ?Sized,
{
    let period = Duration::from_micros(crate::util::period_us(opts.rate_hz));
    let epoch = clock.now();
    let mut stats = RunStats::default();
    let mut feedback = Feedback::default();

    tracing::info!(rate_hz = opts.rate_hz, max_cycles = ?opts.max_cycles, "control loop start");

    let mut cycle: u64 = 0;
    loop {
        if opts.max_cycles.is_some_and(|m| cycle >= m) {
            break;
        }
        if interrupted(opts) {
            tracing::info!(cycles = stats.cycles, "control loop interrupted");
            return Err(eyre::Report::new(ControllerError::Interrupted {
                cycles: stats.cycles,
            }));
        }

        let started = clock.now();
        let input = source
            .next_input(cycle)
            .map_err(|e| eyre::Report::new(ControllerError::Input(e.to_string())))?;
        let Some(mut input) = input else {
            tracing::debug!(cycle, "input source exhausted");
            break;
        };

        if let Some(src) = tuning.as_deref_mut()
            && controller.reload_due(cycle)
        {
            poll_tuning(controller, src, &mut stats);
        }

        input.state.feedback = feedback;
        let frames = controller.update(
            cycle,
            input.engaged,
            &mut input.state,
            &input.request,
            &input.hud,
        );
        feedback = input.state.feedback;

        let steered = frames
            .iter()
            .any(|f| matches!(f.message, Message::SteeringControl { active: true, .. }));
        let rate_limited = steered && controller.steer_rate_limited();
        if rate_limited {
            stats.steer_rate_limited += 1;
        }
        tracing::trace!(
            cycle,
            frames = frames.len(),
            steer = controller.last_steer(),
            rate_limited,
            "cycle sent"
        );

        transport
            .send(&frames)
            .map_err(|e| eyre::Report::new(ControllerError::Transport(e.to_string())))?;

        let spent = clock.us_since(started);
        stats.cycles += 1;
        stats.frames += frames.len() as u64;
        stats.total_cycle_us = stats.total_cycle_us.saturating_add(spent);
        stats.max_cycle_us = stats.max_cycle_us.max(spent);

        let deadline = epoch + period * u32::try_from(cycle + 1).unwrap_or(u32::MAX);
        if clock.now() > deadline {
            stats.missed_deadlines += 1;
            tracing::debug!(cycle, spent_us = spent, "cycle deadline missed");
        } else {
            clock.sleep_until(deadline);
        }
        cycle += 1;
    }

    tracing::info!(
        cycles = stats.cycles,
        frames = stats.frames,
        missed = stats.missed_deadlines,
        steer_rate_limited = stats.steer_rate_limited,
        max_cycle_us = stats.max_cycle_us,
        "control loop complete"
    );
    Ok(stats)
}
