//! Longitudinal command generator: gas/regen and friction brake.
//!
//! Policies are applied in a fixed order each longitudinal step: baseline
//! lookup, one-pedal loop, lead lockout, coasting, then the global gates.

pub mod coasting;
pub mod lockout;
pub mod one_pedal;

use crate::config::{LongitudinalParams, OnePedalTuning};
use crate::curve::interp;
use crate::state::{ActuatorRequest, VehicleState};

pub use lockout::{LockoutFactors, LockoutInputs, lockout_factors};
pub use one_pedal::{OnePedalInput, OnePedalLoop};

/// Accelerator position below which the pedal counts as released.
pub const GAS_RELEASED_EPS: f32 = 1e-5;
/// Requested accel below which lead braking may take over.
const LEAD_BRAKING_ACCEL: f32 = -0.1;
/// Pitch-compensated accel is blended in between these speeds (m/s).
const ACCEL_PITCH_FACTOR_BP: [f32; 2] = [5.0, 10.0];
const ACCEL_PITCH_FACTOR_V: [f32; 2] = [0.0, 1.0];

/// Everything a longitudinal step reads besides parameters.
#[derive(Debug, Clone, Copy)]
pub struct LongitudinalContext<'a> {
    /// Seconds since start, derived from the cycle index.
    pub t: f64,
    /// Step period in seconds.
    pub dt: f32,
    pub engaged: bool,
    pub state: &'a VehicleState,
    pub request: &'a ActuatorRequest,
}

/// Result of one longitudinal step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongitudinalOutput {
    pub gas: i32,
    pub brake: i32,
    /// Gas looked up from the non pitch-compensated accel; 0 when the
    /// baseline did not run.
    pub no_pitch_gas: f32,
    pub brakes_allowed: bool,
    pub lead_braking_active: bool,
    pub lockout: LockoutFactors,
}

#[derive(Debug, Clone)]
pub struct LongitudinalGenerator {
    one_pedal: OnePedalLoop,
    gas: i32,
    brake: i32,
    threshold_accel: f32,
    lead_accel_last_t: f64,
    lead_braking_active: bool,
    brakes_allowed: bool,
}

impl LongitudinalGenerator {
    /// `rate` is the longitudinal update rate in Hz.
    pub fn new(p: &LongitudinalParams, t: &OnePedalTuning, rate: f32) -> Self {
        Self {
            one_pedal: OnePedalLoop::new(t, rate),
            gas: p.max_acc_regen,
            brake: 0,
            threshold_accel: 0.0,
            lead_accel_last_t: f64::NEG_INFINITY,
            lead_braking_active: false,
            brakes_allowed: false,
        }
    }

    pub fn retune(&mut self, t: &OnePedalTuning) {
        self.one_pedal.retune(t);
    }

    pub fn one_pedal(&self) -> &OnePedalLoop {
        &self.one_pedal
    }

    pub fn gas(&self) -> i32 {
        self.gas
    }

    pub fn brake(&self) -> i32 {
        self.brake
    }

    pub fn brakes_allowed(&self) -> bool {
        self.brakes_allowed
    }

    pub fn threshold_accel(&self) -> f32 {
        self.threshold_accel
    }

    /// Final commands after the standstill machine; they seed the next step.
    pub fn set_commands(&mut self, gas: i32, brake: i32) {
        self.gas = gas;
        self.brake = brake;
    }

    pub fn step(
        &mut self,
        ctx: &LongitudinalContext<'_>,
        p: &LongitudinalParams,
        tuning: &OnePedalTuning,
    ) -> LongitudinalOutput {
        let s = ctx.state;
        let req = ctx.request;
        let engaged = ctx.engaged;
        let one_pedal_active = s.one_pedal.active;
        let pedal_released = s.gas < GAS_RELEASED_EPS;

        let loop_active = one_pedal_active && !engaged && pedal_released && !s.brake_pressed;
        if !loop_active {
            self.one_pedal.reset(s.a_ego);
        }

        let baseline_runs = engaged
            || one_pedal_active
            || s.lead_braking_enabled
            || (s.pause_long_on_gas && s.gas > p.gas_pressed_threshold);

        let mut no_pitch_gas = 0.0;
        let mut factors = LockoutFactors::UNALTERED;
        if baseline_runs {
            let k = interp(s.v_ego, &ACCEL_PITCH_FACTOR_BP, &ACCEL_PITCH_FACTOR_V);
            let brake_accel = k * req.accel_pitch_compensated + (1.0 - k) * req.accel;

            let use_min_speed = one_pedal_active
                && (!s.lead_braking_enabled
                    || ctx.t - self.lead_accel_last_t > f64::from(tuning.lead_accel_lockout_s));
            let threshold_speed = if use_min_speed {
                s.v_ego.max(tuning.min_speed)
            } else {
                s.v_ego
            };
            self.threshold_accel = p.gas_brake_threshold.eval(threshold_speed);

            let mut gas = p.gas_lookup.eval(req.accel_pitch_compensated);
            no_pitch_gas = p.gas_lookup.eval(req.accel);
            let mut brake = p.brake_lookup.eval(brake_accel);

            let lead = s.tracked_lead();
            let mut lead_braking_active = s.lead_braking_enabled
                && !engaged
                && lead.is_some()
                && req.accel < LEAD_BRAKING_ACCEL
                && s.coasting.plan_source.is_brake_source();

            factors = lockout_factors(&s.lockout, lead, s.v_ego, s.follow_time_headway);

            if loop_active {
                gas = p.max_acc_regen as f32;
                let inp = OnePedalInput {
                    v_ego: s.v_ego,
                    a_ego: s.a_ego,
                    pitch: s.pitch,
                    steering_angle_deg: s.steering_angle_deg,
                    drive_mode: s.drive_mode,
                    temporary: s.one_pedal.temporary,
                    dl_coasting_enabled: s.one_pedal.dl_coasting_enabled,
                    threshold_accel: self.threshold_accel,
                };
                let one_pedal_brake = self.one_pedal.step(tuning, &p.brake_lookup, &inp, ctx.dt);
                if one_pedal_brake > 0.0
                    && (!s.lead_braking_enabled || one_pedal_brake > brake || lead.is_none())
                {
                    brake = one_pedal_brake;
                    lead_braking_active = false;
                }
                if lead_braking_active {
                    self.lead_accel_last_t = ctx.t;
                }
            }

            if engaged {
                coasting::apply(s, p, factors, &mut gas, &mut brake);
            }

            self.gas = gas.round() as i32;
            self.brake = brake.round() as i32;
            self.lead_braking_active = lead_braking_active;
        } else {
            self.lead_braking_active = false;
        }

        let forward = s.gear.is_forward();
        self.brakes_allowed = (s.long_active || engaged || one_pedal_active || self.lead_braking_active)
            && pedal_released
            && s.cruise_main
            && forward
            && !s.brake_pressed;

        if !s.cruise_main
            || s.brake_pressed
            || !forward
            || !engaged
            || s.gas >= p.gas_pressed_threshold
        {
            self.gas = p.max_acc_regen;
        }
        if !self.brakes_allowed {
            self.brake = 0;
        }
        self.gas = self.gas.clamp(0, p.max_gas);
        self.brake = self.brake.clamp(0, p.max_brake);

        tracing::trace!(
            gas = self.gas,
            brake = self.brake,
            brakes_allowed = self.brakes_allowed,
            lead_braking = self.lead_braking_active,
            decel = self.one_pedal.decel(),
            "longitudinal step"
        );

        LongitudinalOutput {
            gas: self.gas,
            brake: self.brake,
            no_pitch_gas,
            brakes_allowed: self.brakes_allowed,
            lead_braking_active: self.lead_braking_active,
            lockout: factors,
        }
    }
}
