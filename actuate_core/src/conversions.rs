//! Conversions from `actuate_config` types to the runtime parameter types.
//!
//! TOML tables are only shape-checked by `actuate_config`; curve construction
//! here is the second gate, so a table that slips past one still fails build.

use crate::config::{
    ControllerParams, LongitudinalParams, MPH_TO_MS, OnePedalTuning, SchedulePeriods, SteerLimits,
};
use crate::curve::Curve;
use crate::error::BuildError;

// ── SteerLimits ──────────────────────────────────────────────────────────────

impl From<&actuate_config::SteeringCfg> for SteerLimits {
    fn from(c: &actuate_config::SteeringCfg) -> Self {
        Self {
            max: c.max,
            delta_up: c.delta_up,
            delta_down: c.delta_down,
            driver_allowance: c.driver_allowance,
            driver_multiplier: c.driver_multiplier,
            driver_factor: c.driver_factor,
            free_torque: c.free_torque,
            min_speed: c.min_speed_mph * MPH_TO_MS,
        }
    }
}

// ── LongitudinalParams ───────────────────────────────────────────────────────

impl TryFrom<&actuate_config::LongitudinalCfg> for LongitudinalParams {
    type Error = BuildError;

    fn try_from(c: &actuate_config::LongitudinalCfg) -> Result<Self, Self::Error> {
        Ok(Self {
            max_gas: c.max_gas,
            zero_gas: c.zero_gas,
            max_acc_regen: c.max_acc_regen,
            max_brake: c.max_brake,
            near_stop_brake_phase: c.near_stop_brake_phase,
            gas_pressed_threshold: c.gas_pressed_threshold,
            gas_lookup: Curve::monotonic(c.gas_lookup.bp.clone(), c.gas_lookup.v.clone())
                .map_err(BuildError::curve("gas_lookup"))?,
            brake_lookup: Curve::monotonic(c.brake_lookup.bp.clone(), c.brake_lookup.v.clone())
                .map_err(BuildError::curve("brake_lookup"))?,
            gas_brake_threshold: Curve::new(
                c.gas_brake_threshold.bp.clone(),
                c.gas_brake_threshold.v.clone(),
            )
            .map_err(BuildError::curve("gas_brake_threshold"))?,
        })
    }
}

// ── SchedulePeriods ──────────────────────────────────────────────────────────

impl From<&actuate_config::ScheduleCfg> for SchedulePeriods {
    fn from(c: &actuate_config::ScheduleCfg) -> Self {
        Self {
            steer: c.steer,
            longitudinal: c.longitudinal,
            time_headlights: c.time_headlights,
            speed_yaw: c.speed_yaw,
            adas_keepalive: c.adas_keepalive,
            camera_keepalive: c.camera_keepalive,
            tuning_reload: c.tuning_reload,
        }
    }
}

// ── OnePedalTuning ───────────────────────────────────────────────────────────

fn mph(bp: &[f32]) -> Vec<f32> {
    bp.iter().map(|v| v * MPH_TO_MS).collect()
}

/// Two-point factor curve whose `slot` end is replaced by `value`.
fn factor_curve(
    name: &'static str,
    bp: Vec<f32>,
    mut v: [f32; 2],
    slot: usize,
    value: f32,
) -> Result<Curve, BuildError> {
    v[slot] = value;
    Curve::new(bp, v).map_err(BuildError::curve(name))
}

impl TryFrom<&actuate_config::OnePedalCfg> for OnePedalTuning {
    type Error = BuildError;

    fn try_from(c: &actuate_config::OnePedalCfg) -> Result<Self, Self::Error> {
        let decel = Curve::new(mph(&c.decel_bp_mph), c.decel_ms2.clone())
            .map_err(BuildError::curve("one_pedal.decel"))?;
        let regen_paddle_decel = decel.scaled(c.regen_paddle_decel_factor);
        let one_time_decel = decel.scaled(c.one_time_stop_decel_factor);
        let max_decel = OnePedalTuning::floor_for(&decel, &regen_paddle_decel, &one_time_decel);

        let pid_bp = mph(&c.pid.speed_mph);
        let gains = |name: &'static str, v: &[f32]| {
            Curve::new(pid_bp.clone(), v.to_vec()).map_err(BuildError::curve(name))
        };

        let tuning = Self {
            decel,
            regen_paddle_decel,
            one_time_decel,
            max_decel,
            rate_up: c.rate_ramp_up,
            rate_down: c.rate_ramp_down,
            rate_speed_factor: factor_curve(
                "one_pedal.rate_low_speed_factor",
                mph(&c.rate_low_speed_factor_bp_mph),
                [0.0, 1.0],
                0,
                c.rate_low_speed_factor,
            )?,
            rate_steer_factor: factor_curve(
                "one_pedal.rate_high_steer_factor",
                c.rate_high_steer_factor_bp_deg.clone(),
                [1.0, 0.0],
                1,
                c.rate_high_steer_factor,
            )?,
            speed_error_factor: Curve::new(
                c.speed_error_factor_bp.clone(),
                c.speed_error_factor.clone(),
            )
            .map_err(BuildError::curve("one_pedal.speed_error_factor"))?,
            pitch_factor_decline: factor_curve(
                "one_pedal.pitch_factor_decline",
                vec![4.0, 8.0],
                [0.0, 1.0],
                0,
                c.low_speed_pitch_factor_decline,
            )?,
            pitch_factor_incline: factor_curve(
                "one_pedal.pitch_factor_incline",
                vec![4.0, 8.0],
                [0.0, 1.0],
                0,
                c.low_speed_pitch_factor_incline,
            )?,
            min_speed: c.min_speed,
            lead_accel_lockout_s: c.lead_accel_lockout_s,
            kp: gains("one_pedal.pid.kp", &c.pid.kp)?,
            ki: gains("one_pedal.pid.ki", &c.pid.ki)?,
            kd: gains("one_pedal.pid.kd", &c.pid.kd)?,
        };
        tuning.validate()?;
        Ok(tuning)
    }
}

// ── ControllerParams ─────────────────────────────────────────────────────────

impl TryFrom<&actuate_config::Config> for ControllerParams {
    type Error = BuildError;

    fn try_from(c: &actuate_config::Config) -> Result<Self, Self::Error> {
        let params = Self {
            steer: SteerLimits::from(&c.steering),
            long: LongitudinalParams::try_from(&c.longitudinal)?,
            schedule: SchedulePeriods::from(&c.schedule),
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_default_params() {
        let cfg = actuate_config::Config::default();
        let params = ControllerParams::try_from(&cfg).expect("params");
        assert_eq!(params, ControllerParams::default());
        let tuning = OnePedalTuning::try_from(&cfg.one_pedal).expect("tuning");
        assert_eq!(tuning.decel, OnePedalTuning::default().decel);
        assert!((tuning.max_decel - OnePedalTuning::default().max_decel).abs() < 1e-6);
    }

    #[test]
    fn rejects_unsorted_profile_breakpoints() {
        let mut cfg = actuate_config::OnePedalCfg::default();
        cfg.decel_bp_mph = vec![6.0, 0.5];
        let err = OnePedalTuning::try_from(&cfg).expect_err("must fail");
        assert!(matches!(err, BuildError::Curve { name: "one_pedal.decel", .. }));
    }

    #[test]
    fn rejects_positive_decel_profile() {
        let mut cfg = actuate_config::OnePedalCfg::default();
        cfg.decel_ms2 = vec![0.2, -1.0];
        assert!(OnePedalTuning::try_from(&cfg).is_err());
    }
}
