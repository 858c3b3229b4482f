//! The per-cycle actuation engine.

use crate::command::{CanBus, CanCommand, Message};
use crate::config::{ControllerParams, DT_CTRL, MS_TO_KPH, OnePedalTuning};
use crate::error::{BuildError, Result};
use crate::hud;
use crate::longitudinal::{LongitudinalContext, LongitudinalGenerator};
use crate::scheduler::{MessageKind, Scheduler};
use crate::standstill::{StandstillMachine, StandstillPhase};
use crate::state::{ActuatorRequest, HudParams, VehicleState, VisualAlert};
use crate::steering::SteeringGenerator;

/// |steer| above which the LKA icon turns critical.
const LKA_CRITICAL_STEER: f32 = 0.9;
/// ADAS time ticks per second.
const ADAS_TIME_HZ: u64 = 60;

/// Actuation engine. Owns all cross-cycle state; one `update` per cycle.
pub struct Controller {
    params: ControllerParams,
    tuning: OnePedalTuning,
    scheduler: Scheduler,
    steering: SteeringGenerator,
    longitudinal: LongitudinalGenerator,
    standstill: StandstillMachine,
    last_cycle: Option<u64>,
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("last_cycle", &self.last_cycle)
            .field("last_steer", &self.steering.last_torque())
            .field("gas", &self.longitudinal.gas())
            .field("brake", &self.longitudinal.brake())
            .field("phase", &self.standstill.phase())
            .finish()
    }
}

impl Controller {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    pub fn tuning(&self) -> &OnePedalTuning {
        &self.tuning
    }

    pub fn last_steer(&self) -> i32 {
        self.steering.last_torque()
    }

    pub fn steer_rate_limited(&self) -> bool {
        self.steering.rate_limited()
    }

    pub fn one_pedal_decel(&self) -> f32 {
        self.longitudinal.one_pedal().decel()
    }

    pub fn phase(&self) -> StandstillPhase {
        self.standstill.phase()
    }

    /// Tuning reload is due on this cycle.
    pub fn reload_due(&self, cycle: u64) -> bool {
        let p = u64::from(self.params.schedule.tuning_reload.max(1));
        self.scheduler.is_due(MessageKind::Longitudinal, cycle) && cycle % p == 0
    }

    /// Swap in new one-pedal tuning. Invalid tuning is refused and the
    /// current one stays active.
    pub fn reload(&mut self, tuning: OnePedalTuning) -> core::result::Result<(), BuildError> {
        if let Err(e) = tuning.validate() {
            tracing::warn!(error = %e, "tuning reload refused");
            return Err(e);
        }
        self.longitudinal.retune(&tuning);
        self.tuning = tuning;
        tracing::debug!(max_decel = self.tuning.max_decel, "tuning reloaded");
        Ok(())
    }

    /// Run one control cycle and return the frames to transmit, in order.
    ///
    /// Writes `state.feedback`; every other field of `state` is read only.
    pub fn update(
        &mut self,
        cycle: u64,
        engaged: bool,
        state: &mut VehicleState,
        req: &ActuatorRequest,
        hud_params: &HudParams,
    ) -> Vec<CanCommand> {
        if let Some(last) = self.last_cycle
            && cycle != last.wrapping_add(1)
        {
            tracing::debug!(last, cycle, "cycle index not contiguous");
        }
        self.last_cycle = Some(cycle);

        let mut out = Vec::with_capacity(12);
        let sched = &self.scheduler;

        if sched.is_due(MessageKind::Steering, cycle)
            && let Some(f) = self
                .steering
                .update(engaged, state, req, &self.params.steer)
        {
            out.push(CanCommand::new(
                CanBus::Powertrain,
                f.counter,
                Message::SteeringControl {
                    torque: f.torque,
                    active: f.active,
                },
            ));
        }

        if sched.is_due(MessageKind::Longitudinal, cycle) {
            let idx = sched.counter(MessageKind::Longitudinal, cycle);
            let period = sched.period(MessageKind::Longitudinal);
            let ctx = LongitudinalContext {
                t: cycle as f64 * f64::from(DT_CTRL),
                dt: DT_CTRL * period as f32,
                engaged,
                state,
                request: req,
            };
            let long = self
                .longitudinal
                .step(&ctx, &self.params.long, &self.tuning);
            let d = self
                .standstill
                .step(engaged, state, &long, &self.params.long);
            self.longitudinal.set_commands(d.gas, d.brake);

            out.push(CanCommand::new(
                CanBus::Chassis,
                idx,
                Message::FrictionBrake {
                    brake: d.brake,
                    near_stop: d.near_stop,
                    at_full_stop: d.at_full_stop,
                },
            ));
            if let Some(g) = d.gas_frame {
                out.push(CanCommand::new(
                    CanBus::Powertrain,
                    idx,
                    Message::GasRegen {
                        gas: g.gas,
                        acc_engaged: g.acc_engaged,
                        at_full_stop: g.at_full_stop,
                    },
                ));
            }

            let fb = &mut state.feedback;
            fb.auto_hold_activated = d.auto_hold_activated;
            fb.lead_braking_active = long.lead_braking_active;
            fb.resume_required = d.resume_required;
            fb.resume_button |= d.resume_button;
        }

        state.feedback.brake_cmd = self.longitudinal.brake();
        state.feedback.gas_cmd = self.longitudinal.gas();
        if state.show_brake_indicator {
            state.feedback.brake_percent = hud::brake_percent(
                state,
                &self.params.long,
                self.longitudinal.gas(),
                self.longitudinal.brake(),
                state.feedback.lead_braking_active,
            );
        }

        let sched = &mut self.scheduler;
        if sched.is_due(MessageKind::Dashboard, cycle) {
            out.push(CanCommand::new(
                CanBus::Powertrain,
                sched.counter(MessageKind::Dashboard, cycle),
                Message::AccDashboard {
                    engaged,
                    set_speed_kph: hud_params.v_cruise * MS_TO_KPH,
                    lead_visible: hud_params.show_car,
                    follow_level: state.follow_level,
                    fcw: hud_params.alert == VisualAlert::Fcw,
                    resume_button: state.feedback.resume_button,
                },
            ));
            state.feedback.resume_button = false;
        }

        if sched.is_due(MessageKind::TimeHeadlights, cycle) {
            let idx = sched.counter(MessageKind::TimeHeadlights, cycle);
            let ticks = (cycle.wrapping_mul(ADAS_TIME_HZ) / 100) as u32;
            out.push(CanCommand::new(
                CanBus::Obstacle,
                idx,
                Message::AdasTime { ticks },
            ));
            out.push(CanCommand::new(CanBus::Obstacle, idx, Message::AdasHeadlights));
        }

        if sched.is_due(MessageKind::SpeedYaw, cycle) {
            let idx = sched.counter(MessageKind::SpeedYaw, cycle);
            out.push(CanCommand::new(
                CanBus::Obstacle,
                idx,
                Message::AdasSteeringStatus,
            ));
            out.push(CanCommand::new(
                CanBus::Obstacle,
                idx,
                Message::AdasAccelSpeed {
                    speed: state.v_ego,
                },
            ));
        }

        if sched.is_due(MessageKind::AdasKeepalive, cycle) {
            let idx = sched.counter(MessageKind::AdasKeepalive, cycle);
            for index in 0..2 {
                out.push(CanCommand::new(
                    CanBus::Powertrain,
                    idx,
                    Message::AdasKeepalive { index },
                ));
            }
        }

        let lka_active = state.lkas_active;
        let lka_critical = lka_active && req.steer.abs() > LKA_CRITICAL_STEER;
        if sched.lka_icon_due(cycle, (lka_active, lka_critical)) {
            out.push(CanCommand::new(
                CanBus::SwGmlan,
                sched.counter(MessageKind::LkaIcon, cycle),
                Message::LkaIcon {
                    active: lka_active,
                    critical: lka_critical,
                    steer_alert: matches!(
                        hud_params.alert,
                        VisualAlert::SteerRequired | VisualAlert::Ldw
                    ),
                },
            ));
        }

        tracing::trace!(cycle, frames = out.len(), "cycle complete");
        out
    }
}

/// Builder for `Controller`. Parameters are validated on `build()`.
#[derive(Debug, Default)]
pub struct ControllerBuilder {
    params: Option<ControllerParams>,
    tuning: Option<OnePedalTuning>,
}

impl ControllerBuilder {
    pub fn with_params(mut self, params: ControllerParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_tuning(mut self, tuning: OnePedalTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Build from a parsed config file.
    pub fn with_config(self, cfg: &actuate_config::Config) -> Result<Self> {
        let params = ControllerParams::try_from(cfg).map_err(eyre::Report::new)?;
        let tuning = OnePedalTuning::try_from(&cfg.one_pedal).map_err(eyre::Report::new)?;
        Ok(self.with_params(params).with_tuning(tuning))
    }

    pub fn build(self) -> Result<Controller> {
        let params = self
            .params
            .ok_or_else(|| eyre::Report::new(BuildError::MissingParams))?;
        params.validate().map_err(eyre::Report::new)?;
        let tuning = self.tuning.unwrap_or_default();
        tuning.validate().map_err(eyre::Report::new)?;

        let long_period = params.schedule.longitudinal.max(1);
        let rate = 1.0 / (DT_CTRL * long_period as f32);
        Ok(Controller {
            scheduler: Scheduler::new(&params.schedule),
            steering: SteeringGenerator::new(),
            longitudinal: LongitudinalGenerator::new(&params.long, &tuning, rate),
            standstill: StandstillMachine::new(),
            last_cycle: None,
            params,
            tuning,
        })
    }
}
