//! Runtime parameter types for the actuation engine.
//!
//! These are separate from the TOML-deserialized config in `actuate_config`;
//! see `conversions` for the validated mapping between the two.

use crate::curve::Curve;
use crate::error::BuildError;

/// Control cycle period in seconds (100 Hz).
pub const DT_CTRL: f32 = 0.01;
pub const MPH_TO_MS: f32 = 0.447_04;
pub const KPH_TO_MS: f32 = 1.0 / 3.6;
pub const MS_TO_KPH: f32 = 3.6;
pub const ACCELERATION_DUE_TO_GRAVITY: f32 = 9.81;

/// Steering torque limits in device units.
#[derive(Debug, Clone, PartialEq)]
pub struct SteerLimits {
    pub max: i32,
    /// Max increase in magnitude per steering frame.
    pub delta_up: i32,
    /// Max decrease in magnitude per steering frame.
    pub delta_down: i32,
    pub driver_allowance: i32,
    pub driver_multiplier: i32,
    pub driver_factor: i32,
    /// When both the previous and requested torque magnitudes are within this
    /// band the delta limiter is bypassed. 0 disables the band.
    pub free_torque: i32,
    /// Minimum ego speed (m/s) for steering to be enabled.
    pub min_speed: f32,
}

impl Default for SteerLimits {
    fn default() -> Self {
        Self {
            max: 300,
            delta_up: 7,
            delta_down: 17,
            driver_allowance: 50,
            driver_multiplier: 4,
            driver_factor: 100,
            free_torque: 0,
            min_speed: 6.7 * MPH_TO_MS,
        }
    }
}

/// Gas/regen and friction brake device parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LongitudinalParams {
    pub max_gas: i32,
    pub zero_gas: i32,
    pub max_acc_regen: i32,
    pub max_brake: i32,
    pub near_stop_brake_phase: f32,
    pub gas_pressed_threshold: f32,
    /// Acceleration (m/s^2) → raw gas/regen command.
    pub gas_lookup: Curve,
    /// Acceleration (m/s^2) → raw friction brake command.
    pub brake_lookup: Curve,
    /// Speed (m/s) → accel threshold where regen hands over to friction braking.
    pub gas_brake_threshold: Curve,
}

impl Default for LongitudinalParams {
    fn default() -> Self {
        Self {
            max_gas: 3072,
            zero_gas: 2048,
            max_acc_regen: 1404,
            max_brake: 350,
            near_stop_brake_phase: 0.5,
            gas_pressed_threshold: 0.06,
            gas_lookup: Curve::from_static(&[-1.0, 0.0, 2.0], &[1404.0, 2048.0, 3072.0]),
            brake_lookup: Curve::from_static(&[-1.0, -0.1], &[350.0, 0.0]),
            gas_brake_threshold: Curve::from_static(&[0.0, 10.0, 30.0], &[-0.08, -0.3, -0.6]),
        }
    }
}

/// One-pedal tuning. Hot-reloadable through `Controller::reload`.
#[derive(Debug, Clone, PartialEq)]
pub struct OnePedalTuning {
    /// Standard profile: speed (m/s) → target decel.
    pub decel: Curve,
    /// Profile used with the regen paddle engaged.
    pub regen_paddle_decel: Curve,
    /// Profile used for a temporary (one-shot) stop.
    pub one_time_decel: Curve,
    /// Hard floor of commanded decel (most negative allowed).
    pub max_decel: f32,
    /// Decel ramp rates in m/s^2 per second.
    pub rate_up: f32,
    pub rate_down: f32,
    /// Speed (m/s) → rate-limit factor.
    pub rate_speed_factor: Curve,
    /// |steering angle| (deg) → rate-limit factor.
    pub rate_steer_factor: Curve,
    /// Speed (m/s) → error scale of the decel loop.
    pub speed_error_factor: Curve,
    /// Speed (m/s) → share of pitch compensation kept on declines.
    pub pitch_factor_decline: Curve,
    /// Speed (m/s) → share of pitch compensation kept on inclines.
    pub pitch_factor_incline: Curve,
    pub min_speed: f32,
    /// Seconds after a lead-triggered brake during which the real speed is
    /// used for the gas/brake threshold instead of `min_speed`.
    pub lead_accel_lockout_s: f32,
    pub kp: Curve,
    pub ki: Curve,
    pub kd: Curve,
}

impl OnePedalTuning {
    /// Margin below the most aggressive profile that the floor allows.
    pub const FLOOR_MARGIN: f32 = 0.5;

    /// Floor derived from the three profiles.
    pub fn floor_for(decel: &Curve, paddle: &Curve, one_time: &Curve) -> f32 {
        decel
            .min_value()
            .min(paddle.min_value())
            .min(one_time.min_value())
            - Self::FLOOR_MARGIN
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        for c in [&self.decel, &self.regen_paddle_decel, &self.one_time_decel] {
            if c.max_value() > 0.0 {
                return Err(BuildError::InvalidConfig(
                    "one-pedal decel profiles must be <= 0",
                ));
            }
        }
        if !self.max_decel.is_finite() || self.max_decel >= 0.0 {
            return Err(BuildError::InvalidConfig("one-pedal max_decel must be < 0"));
        }
        if !(self.rate_up > 0.0 && self.rate_down > 0.0) {
            return Err(BuildError::InvalidConfig(
                "one-pedal rate_up/rate_down must be > 0",
            ));
        }
        for c in [
            &self.rate_speed_factor,
            &self.rate_steer_factor,
            &self.pitch_factor_decline,
            &self.pitch_factor_incline,
        ] {
            if c.min_value() < 0.0 || c.max_value() > 1.0 {
                return Err(BuildError::InvalidConfig(
                    "one-pedal factors must be in [0.0, 1.0]",
                ));
            }
        }
        if self.speed_error_factor.min_value() < 0.0 {
            return Err(BuildError::InvalidConfig(
                "one-pedal speed error factor must be >= 0",
            ));
        }
        if self.min_speed < 0.0 || self.lead_accel_lockout_s < 0.0 {
            return Err(BuildError::InvalidConfig(
                "one-pedal min_speed/lead_accel_lockout_s must be >= 0",
            ));
        }
        Ok(())
    }
}

impl Default for OnePedalTuning {
    fn default() -> Self {
        let bp = [0.5 * MPH_TO_MS, 6.0 * MPH_TO_MS];
        let decel = Curve::from_static(&bp, &[-1.0, -1.1]);
        let regen_paddle_decel = decel.scaled(1.3);
        let one_time_decel = decel.scaled(1.3);
        let max_decel = Self::floor_for(&decel, &regen_paddle_decel, &one_time_decel);
        let pid_bp = [11.0 * MPH_TO_MS, 78.0 * MPH_TO_MS];
        Self {
            decel,
            regen_paddle_decel,
            one_time_decel,
            max_decel,
            rate_up: 0.8,
            rate_down: 0.8,
            rate_speed_factor: Curve::from_static(&[0.0, 10.0 * MPH_TO_MS], &[0.2, 1.0]),
            rate_steer_factor: Curve::from_static(&[20.0, 120.0], &[1.0, 0.2]),
            speed_error_factor: Curve::from_static(&[1.5, 20.0], &[0.4, 0.2]),
            pitch_factor_decline: Curve::from_static(&[4.0, 8.0], &[0.4, 1.0]),
            pitch_factor_incline: Curve::from_static(&[4.0, 8.0], &[0.2, 1.0]),
            min_speed: 2.1,
            lead_accel_lockout_s: 0.6,
            kp: Curve::from_static(&pid_bp, &[2.4, 1.5]),
            ki: Curve::from_static(&pid_bp, &[0.36, 0.36]),
            kd: Curve::from_static(&pid_bp, &[0.0, 0.0]),
        }
    }
}

/// Message periods in control cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePeriods {
    pub steer: u32,
    pub longitudinal: u32,
    pub time_headlights: u32,
    pub speed_yaw: u32,
    pub adas_keepalive: u32,
    pub camera_keepalive: u32,
    pub tuning_reload: u32,
}

impl Default for SchedulePeriods {
    fn default() -> Self {
        Self {
            steer: 2,
            longitudinal: 4,
            time_headlights: 10,
            speed_yaw: 2,
            adas_keepalive: 100,
            camera_keepalive: 100,
            tuning_reload: 48,
        }
    }
}

/// Static, vehicle-specific parameters loaded once at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerParams {
    pub steer: SteerLimits,
    pub long: LongitudinalParams,
    pub schedule: SchedulePeriods,
}

impl ControllerParams {
    pub fn validate(&self) -> Result<(), BuildError> {
        let s = &self.steer;
        if s.max <= 0 || s.delta_up <= 0 || s.delta_down <= 0 {
            return Err(BuildError::InvalidConfig(
                "steer max/delta_up/delta_down must be > 0",
            ));
        }
        if s.free_torque < 0 || s.free_torque > s.max {
            return Err(BuildError::InvalidConfig(
                "steer free_torque must be in [0, max]",
            ));
        }
        let l = &self.long;
        if !(0 <= l.max_acc_regen && l.max_acc_regen <= l.zero_gas && l.zero_gas <= l.max_gas) {
            return Err(BuildError::InvalidConfig(
                "gas range must satisfy 0 <= max_acc_regen <= zero_gas <= max_gas",
            ));
        }
        if l.max_brake <= 0 {
            return Err(BuildError::InvalidConfig("max_brake must be > 0"));
        }
        // Lookup maps must be monotonic; a table built with `Curve::new` may not be.
        Curve::monotonic(l.gas_lookup.breakpoints(), l.gas_lookup.values())
            .map_err(BuildError::curve("gas_lookup"))?;
        Curve::monotonic(l.brake_lookup.breakpoints(), l.brake_lookup.values())
            .map_err(BuildError::curve("brake_lookup"))?;
        if l.brake_lookup.min_value() < 0.0 || l.brake_lookup.max_value() > l.max_brake as f32 {
            return Err(BuildError::InvalidConfig(
                "brake_lookup values must be within [0, max_brake]",
            ));
        }
        if l.gas_lookup.min_value() < 0.0 || l.gas_lookup.max_value() > l.max_gas as f32 {
            return Err(BuildError::InvalidConfig(
                "gas_lookup values must be within [0, max_gas]",
            ));
        }
        let p = &self.schedule;
        if [
            p.steer,
            p.longitudinal,
            p.time_headlights,
            p.speed_yaw,
            p.adas_keepalive,
            p.camera_keepalive,
            p.tuning_reload,
        ]
        .contains(&0)
        {
            return Err(BuildError::InvalidConfig("schedule periods must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ControllerParams::default().validate().expect("params");
        OnePedalTuning::default().validate().expect("tuning");
    }

    #[test]
    fn default_floor_is_below_every_profile() {
        let t = OnePedalTuning::default();
        assert!((t.max_decel - (-1.93)).abs() < 1e-5);
    }

    #[test]
    fn rejects_non_monotonic_brake_map() {
        let mut p = ControllerParams::default();
        p.long.brake_lookup = Curve::new([-1.0, -0.5, -0.1], [350.0, 0.0, 100.0]).expect("shape");
        match p.validate() {
            Err(BuildError::Curve { name, .. }) => assert_eq!(name, "brake_lookup"),
            other => panic!("expected curve error, got {other:?}"),
        }
    }
}
