//! Auto-hold / standstill state machine.
//!
//! Decides the friction brake frame flags (near stop, full stop), forces the
//! maximum brake once both hold, and derives the resume annotations.

use crate::config::LongitudinalParams;
use crate::longitudinal::{GAS_RELEASED_EPS, LongitudinalOutput};
use crate::state::VehicleState;

/// Speed below which the car counts as stopped for auto-hold entry (m/s).
const AUTO_HOLD_MAX_SPEED: f32 = 0.02;
/// Below this speed a standstill exit without stopping intent asks the
/// driver to resume manually (m/s).
const MANUAL_RESUME_SPEED: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandstillPhase {
    #[default]
    Driving,
    NearStop,
    FullStop,
    AutoHold,
}

/// Outcome of one standstill step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandstillDecision {
    pub phase: StandstillPhase,
    pub near_stop: bool,
    pub at_full_stop: bool,
    pub brake: i32,
    pub gas: i32,
    /// Gas frame to send; `None` while auto-hold owns the car.
    pub gas_frame: Option<GasFrame>,
    pub auto_hold_activated: bool,
    pub resume_button: bool,
    pub resume_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasFrame {
    pub gas: i32,
    pub acc_engaged: bool,
    pub at_full_stop: bool,
}

#[derive(Debug, Default)]
pub struct StandstillMachine {
    phase: StandstillPhase,
}

impl StandstillMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StandstillPhase {
        self.phase
    }

    /// Auto-hold owns the car this cycle.
    pub fn auto_hold_entry(engaged: bool, s: &VehicleState) -> bool {
        let ah = &s.auto_hold;
        let dwell_ok = (ah.enabled && !ah.regen_paddle_pressed && ah.dwell_autohold_s >= ah.min_dwell_s)
            || (s.one_pedal.active && ah.dwell_one_pedal_s >= ah.min_dwell_s);
        s.cruise_main
            && !engaged
            && !s.park_assist_active
            && dwell_ok
            && ah.available
            && s.gas <= GAS_RELEASED_EPS
            && s.v_ego < AUTO_HOLD_MAX_SPEED
    }

    pub fn step(
        &mut self,
        engaged: bool,
        s: &VehicleState,
        long: &LongitudinalOutput,
        p: &LongitudinalParams,
    ) -> StandstillDecision {
        let mut brake = long.brake;
        let mut gas = long.gas;

        let decision = if Self::auto_hold_entry(engaged, s) {
            let at_full_stop = s.standstill;
            let near_stop = s.v_ego < p.near_stop_brake_phase;
            if at_full_stop && near_stop {
                brake = p.max_brake;
            }
            StandstillDecision {
                phase: StandstillPhase::AutoHold,
                near_stop,
                at_full_stop,
                brake,
                gas,
                gas_frame: None,
                auto_hold_activated: true,
                resume_button: false,
                resume_required: false,
            }
        } else {
            let (near_stop, at_full_stop, car_stopping, standstill) = if long.brakes_allowed {
                let car_stopping = long.no_pitch_gas < p.zero_gas as f32;
                let standstill = s.standstill;
                if standstill {
                    gas = p.max_acc_regen;
                }
                let controlling = engaged || s.one_pedal.active || s.lead_braking_enabled;
                let at_full_stop = controlling && standstill && car_stopping;
                let near_stop = controlling && s.v_ego < p.near_stop_brake_phase && car_stopping;
                (near_stop, at_full_stop, car_stopping, standstill)
            } else {
                (false, false, false, false)
            };
            if at_full_stop && near_stop {
                brake = p.max_brake;
            }

            let mut acc_engaged = engaged;
            let mut resume_button = false;
            let mut resume_required = false;
            if standstill && !car_stopping {
                if s.do_stop_and_go {
                    acc_engaged = false;
                    resume_button = true;
                } else if s.v_ego < MANUAL_RESUME_SPEED {
                    resume_required = true;
                }
            }

            let phase = match (near_stop, at_full_stop) {
                (true, true) => StandstillPhase::FullStop,
                (true, false) => StandstillPhase::NearStop,
                _ => StandstillPhase::Driving,
            };
            StandstillDecision {
                phase,
                near_stop,
                at_full_stop,
                brake,
                gas,
                gas_frame: Some(GasFrame {
                    gas,
                    acc_engaged,
                    at_full_stop,
                }),
                auto_hold_activated: false,
                resume_button,
                resume_required,
            }
        };

        if decision.phase != self.phase {
            tracing::debug!(from = ?self.phase, to = ?decision.phase, "standstill phase");
            self.phase = decision.phase;
        }
        decision
    }
}
