//! Point-mass longitudinal model with a crude steering rack.
//!
//! Gas and brake commands are mapped back to acceleration through the
//! inverse of the controller's own lookup tables, so an ideal plant tracks
//! the requested accel exactly apart from lag, drag and grade.

use crate::error::{Result, SimError};
use actuate_core::command::{CanCommand, Message};
use actuate_core::config::{ACCELERATION_DUE_TO_GRAVITY, LongitudinalParams, SteerLimits};
use actuate_core::curve::interp;

/// First-order actuator lag (s).
const ACCEL_TAU: f32 = 0.3;
/// Aerodynamic drag coefficient, per unit mass (1/m).
const DRAG: f32 = 0.0004;
/// Steering rack rate at full torque (deg/s).
const STEER_RATE_DEG_S: f32 = 120.0;
/// Self-centering of the rack (1/s).
const STEER_CENTERING: f32 = 0.5;

/// Inverse of a monotonic lookup: (values sorted ascending, matching breakpoints).
fn inverse(bp: &[f32], v: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut pairs: Vec<(f32, f32)> = v.iter().copied().zip(bp.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);
    pairs.into_iter().unzip()
}

#[derive(Debug, Clone)]
pub struct Plant {
    pub v: f32,
    pub a: f32,
    /// Road grade in radians, positive uphill.
    pub pitch: f32,
    pub steering_angle_deg: f32,
    /// Counter the steering rack echoes back.
    pub echo: u8,
    pub gas_cmd: i32,
    pub brake_cmd: i32,
    pub torque_cmd: i32,
    /// Distance travelled (m).
    pub odometer: f64,
    /// Time spent stopped (s).
    pub stopped_s: f32,
    pending_echo: Option<u8>,
    gas_inv: (Vec<f32>, Vec<f32>),
    brake_inv: (Vec<f32>, Vec<f32>),
    steer_max: f32,
}

impl Plant {
    pub fn new(v0: f32, long: &LongitudinalParams, steer: &SteerLimits) -> Self {
        Self {
            v: v0.max(0.0),
            a: 0.0,
            pitch: 0.0,
            steering_angle_deg: 0.0,
            echo: 0,
            gas_cmd: long.zero_gas,
            brake_cmd: 0,
            torque_cmd: 0,
            odometer: 0.0,
            stopped_s: 0.0,
            pending_echo: None,
            gas_inv: inverse(long.gas_lookup.breakpoints(), long.gas_lookup.values()),
            brake_inv: inverse(long.brake_lookup.breakpoints(), long.brake_lookup.values()),
            steer_max: steer.max.max(1) as f32,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.v <= 0.0
    }

    /// Accel the current gas and brake commands ask for, before lag and grade.
    pub fn commanded_accel(&self) -> f32 {
        let gas = interp(self.gas_cmd as f32, &self.gas_inv.0, &self.gas_inv.1);
        let brake = if self.brake_cmd > 0 {
            interp(self.brake_cmd as f32, &self.brake_inv.0, &self.brake_inv.1)
        } else {
            0.0
        };
        gas + brake.min(0.0)
    }

    /// Latch one frame from the bus.
    pub fn apply(&mut self, cmd: &CanCommand) {
        match cmd.message {
            Message::GasRegen { gas, .. } => self.gas_cmd = gas,
            Message::FrictionBrake { brake, .. } => self.brake_cmd = brake,
            Message::SteeringControl { torque, .. } => {
                self.torque_cmd = torque;
                self.pending_echo = Some(cmd.counter);
            }
            _ => {}
        }
    }

    /// Advance the model by `dt` seconds.
    pub fn step(&mut self, cycle: u64, dt: f32) -> Result<()> {
        if let Some(echo) = self.pending_echo.take() {
            self.echo = echo;
        }

        let target = self.commanded_accel();
        self.a += (target - self.a) * (dt / ACCEL_TAU).min(1.0);
        let grade = -ACCELERATION_DUE_TO_GRAVITY * self.pitch.sin();
        let net = self.a + grade - DRAG * self.v * self.v;

        let was_moving = !self.is_stopped();
        self.v = (self.v + net * dt).max(0.0);
        self.odometer += f64::from(self.v * dt);
        if self.is_stopped() {
            self.stopped_s += dt;
            if was_moving {
                tracing::debug!(cycle, odometer = self.odometer, "plant came to a stop");
            }
        } else {
            self.stopped_s = 0.0;
        }

        let torque = self.torque_cmd as f32 / self.steer_max;
        self.steering_angle_deg +=
            (torque * STEER_RATE_DEG_S - STEER_CENTERING * self.steering_angle_deg) * dt;

        if !(self.v.is_finite() && self.a.is_finite() && self.steering_angle_deg.is_finite()) {
            return Err(SimError::Diverged {
                cycle,
                what: "non-finite plant state",
            });
        }
        tracing::trace!(cycle, v = self.v, a = self.a, "plant step");
        Ok(())
    }
}
