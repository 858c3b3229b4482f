#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and lookup-table parsing for the actuation engine.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Gas/brake lookup CSV loader enforces headers and checks that the table is
//!   strictly increasing in acceleration and monotonic in command.
use serde::Deserialize;
use serde::de::Deserializer;

/// Lookup CSV schema.
///
/// Expected headers:
/// accel,command
///
/// Example:
/// accel,command
/// -1.0,350
/// -0.1,0
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LookupRow {
    pub accel: f32,
    pub command: f32,
}

/// Piecewise-linear curve as written in TOML.
///
/// Accepts either:
/// - a table: `{ bp = [-1.0, -0.1], v = [350.0, 0.0] }`
/// - an array of pairs: `[[-1.0, 350.0], [-0.1, 0.0]]`
#[derive(Debug, Clone, PartialEq)]
pub struct CurveCfg {
    pub bp: Vec<f32>,
    pub v: Vec<f32>,
}

impl CurveCfg {
    pub fn new(bp: impl Into<Vec<f32>>, v: impl Into<Vec<f32>>) -> Self {
        Self {
            bp: bp.into(),
            v: v.into(),
        }
    }

    /// Check shape and ordering. `monotonic_values` additionally requires the
    /// values to be non-decreasing or non-increasing across the whole table.
    pub fn check(&self, name: &str, monotonic_values: bool) -> eyre::Result<()> {
        if self.bp.is_empty() {
            eyre::bail!("{name}: curve must have at least one breakpoint");
        }
        if self.bp.len() != self.v.len() {
            eyre::bail!(
                "{name}: breakpoint/value length mismatch ({} vs {})",
                self.bp.len(),
                self.v.len()
            );
        }
        if self.bp.iter().chain(self.v.iter()).any(|x| !x.is_finite()) {
            eyre::bail!("{name}: curve contains non-finite values");
        }
        if self.bp.windows(2).any(|w| w[1] <= w[0]) {
            eyre::bail!("{name}: breakpoints must be strictly increasing");
        }
        if monotonic_values {
            let rising = self.v.windows(2).all(|w| w[1] >= w[0]);
            let falling = self.v.windows(2).all(|w| w[1] <= w[0]);
            if !(rising || falling) {
                eyre::bail!("{name}: values must be monotonic");
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CurveToml {
    Table { bp: Vec<f32>, v: Vec<f32> },
    Pairs(Vec<(f32, f32)>),
}

impl<'de> Deserialize<'de> for CurveCfg {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match CurveToml::deserialize(deserializer)? {
            CurveToml::Table { bp, v } => Ok(Self { bp, v }),
            CurveToml::Pairs(pairs) => Ok(Self {
                bp: pairs.iter().map(|p| p.0).collect(),
                v: pairs.iter().map(|p| p.1).collect(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SteeringCfg {
    pub max: i32,
    pub delta_up: i32,
    pub delta_down: i32,
    pub driver_allowance: i32,
    pub driver_multiplier: i32,
    pub driver_factor: i32,
    /// Requests whose old and new magnitudes both stay within this band skip the delta limiter.
    pub free_torque: i32,
    pub min_speed_mph: f32,
}

impl Default for SteeringCfg {
    fn default() -> Self {
        Self {
            max: 300,
            delta_up: 7,
            delta_down: 17,
            driver_allowance: 50,
            driver_multiplier: 4,
            driver_factor: 100,
            free_torque: 0,
            min_speed_mph: 6.7,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LongitudinalCfg {
    pub max_gas: i32,
    pub zero_gas: i32,
    pub max_acc_regen: i32,
    pub max_brake: i32,
    /// Speed (m/s) below which the friction brake enters its near-stop phase.
    pub near_stop_brake_phase: f32,
    /// Accelerator position above which the driver is considered to be on the pedal.
    pub gas_pressed_threshold: f32,
    pub gas_lookup: CurveCfg,
    pub brake_lookup: CurveCfg,
    /// Speed (m/s) → acceleration at which regen hands over to friction braking.
    pub gas_brake_threshold: CurveCfg,
}

impl Default for LongitudinalCfg {
    fn default() -> Self {
        Self {
            max_gas: 3072,
            zero_gas: 2048,
            max_acc_regen: 1404,
            max_brake: 350,
            near_stop_brake_phase: 0.5,
            gas_pressed_threshold: 0.06,
            gas_lookup: CurveCfg::new([-1.0, 0.0, 2.0], [1404.0, 2048.0, 3072.0]),
            brake_lookup: CurveCfg::new([-1.0, -0.1], [350.0, 0.0]),
            gas_brake_threshold: CurveCfg::new([0.0, 10.0, 30.0], [-0.08, -0.3, -0.6]),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PidCfg {
    pub speed_mph: Vec<f32>,
    pub kp: Vec<f32>,
    pub ki: Vec<f32>,
    pub kd: Vec<f32>,
}

impl Default for PidCfg {
    fn default() -> Self {
        Self {
            speed_mph: vec![11.0, 78.0],
            kp: vec![2.4, 1.5],
            ki: vec![0.36, 0.36],
            kd: vec![0.0, 0.0],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OnePedalCfg {
    /// Speed breakpoints (mph) of the decel profile.
    pub decel_bp_mph: Vec<f32>,
    /// Standard one-pedal decel profile (m/s^2, non-positive).
    pub decel_ms2: Vec<f32>,
    pub regen_paddle_decel_factor: f32,
    pub one_time_stop_decel_factor: f32,
    /// Decel ramp rates in m/s^2 per second.
    pub rate_ramp_up: f32,
    pub rate_ramp_down: f32,
    pub rate_low_speed_factor: f32,
    pub rate_low_speed_factor_bp_mph: Vec<f32>,
    pub rate_high_steer_factor: f32,
    pub rate_high_steer_factor_bp_deg: Vec<f32>,
    pub speed_error_factor_bp: Vec<f32>,
    pub speed_error_factor: Vec<f32>,
    pub low_speed_pitch_factor_decline: f32,
    pub low_speed_pitch_factor_incline: f32,
    pub min_speed: f32,
    pub lead_accel_lockout_s: f32,
    pub pid: PidCfg,
}

impl Default for OnePedalCfg {
    fn default() -> Self {
        Self {
            decel_bp_mph: vec![0.5, 6.0],
            decel_ms2: vec![-1.0, -1.1],
            regen_paddle_decel_factor: 1.3,
            one_time_stop_decel_factor: 1.3,
            rate_ramp_up: 0.8,
            rate_ramp_down: 0.8,
            rate_low_speed_factor: 0.2,
            rate_low_speed_factor_bp_mph: vec![0.0, 10.0],
            rate_high_steer_factor: 0.2,
            rate_high_steer_factor_bp_deg: vec![20.0, 120.0],
            speed_error_factor_bp: vec![1.5, 20.0],
            speed_error_factor: vec![0.4, 0.2],
            low_speed_pitch_factor_decline: 0.4,
            low_speed_pitch_factor_incline: 0.2,
            min_speed: 2.1,
            lead_accel_lockout_s: 0.6,
            pid: PidCfg::default(),
        }
    }
}

/// Message periods in control cycles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleCfg {
    pub steer: u32,
    pub longitudinal: u32,
    pub time_headlights: u32,
    pub speed_yaw: u32,
    pub adas_keepalive: u32,
    pub camera_keepalive: u32,
    pub tuning_reload: u32,
}

impl Default for ScheduleCfg {
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Engaged cruise on an open road with a brief slowdown request.
    #[default]
    Cruise,
    /// Not engaged, one-pedal driving in low gear down to a stop.
    OnePedal,
    /// Engaged approach to a stopped lead, ending in standstill.
    LeadStop,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control loop rate in Hz
    pub rate_hz: u32,
    /// Number of cycles to run (0 = until interrupted)
    pub cycles: u64,
    pub scenario: Scenario,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            rate_hz: 100,
            cycles: 3000,
            scenario: Scenario::Cruise,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub steering: SteeringCfg,
    #[serde(default)]
    pub longitudinal: LongitudinalCfg,
    #[serde(default)]
    pub one_pedal: OnePedalCfg,
    #[serde(default)]
    pub schedule: ScheduleCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub runner: RunnerCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Build a lookup curve from CSV rows. Rows must be strictly increasing in
/// acceleration and monotonic in command.
pub fn curve_from_rows(rows: &[LookupRow]) -> eyre::Result<CurveCfg> {
    if rows.len() < 2 {
        eyre::bail!("lookup table requires at least two rows, got {}", rows.len());
    }
    for i in 1..rows.len() {
        if rows[i].accel == rows[i - 1].accel {
            eyre::bail!(
                "lookup rows have duplicate accel values at index {} and {}",
                i - 1,
                i
            );
        }
    }
    let curve = CurveCfg {
        bp: rows.iter().map(|r| r.accel).collect(),
        v: rows.iter().map(|r| r.command).collect(),
    };
    curve.check("lookup csv", true)?;
    Ok(curve)
}

pub fn load_lookup_csv(path: &std::path::Path) -> eyre::Result<CurveCfg> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open lookup CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["accel", "command"];
    let actual: Vec<String> = headers.iter().map(|s| s.trim().to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "lookup CSV must have headers 'accel,command', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<LookupRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    curve_from_rows(&rows)
}

fn check_sorted(name: &str, bp: &[f32]) -> eyre::Result<()> {
    if bp.is_empty() || bp.windows(2).any(|w| w[1] <= w[0]) {
        eyre::bail!("{name} must be non-empty and strictly increasing");
    }
    Ok(())
}

impl OnePedalCfg {
    pub fn validate(&self) -> eyre::Result<()> {
        check_sorted("one_pedal.decel_bp_mph", &self.decel_bp_mph)?;
        if self.decel_ms2.len() != self.decel_bp_mph.len() {
            eyre::bail!("one_pedal.decel_ms2 must match decel_bp_mph in length");
        }
        if self.decel_ms2.iter().any(|d| !d.is_finite() || *d > 0.0) {
            eyre::bail!("one_pedal.decel_ms2 values must be finite and <= 0");
        }
        if !(self.regen_paddle_decel_factor > 0.0 && self.one_time_stop_decel_factor > 0.0) {
            eyre::bail!("one_pedal decel factors must be > 0");
        }
        if !(self.rate_ramp_up > 0.0 && self.rate_ramp_down > 0.0) {
            eyre::bail!("one_pedal.rate_ramp_up/down must be > 0");
        }
        if !(0.0..=1.0).contains(&self.rate_low_speed_factor)
            || !(0.0..=1.0).contains(&self.rate_high_steer_factor)
        {
            eyre::bail!("one_pedal rate factors must be in [0.0, 1.0]");
        }
        check_sorted(
            "one_pedal.rate_low_speed_factor_bp_mph",
            &self.rate_low_speed_factor_bp_mph,
        )?;
        check_sorted(
            "one_pedal.rate_high_steer_factor_bp_deg",
            &self.rate_high_steer_factor_bp_deg,
        )?;
        if self.rate_low_speed_factor_bp_mph.len() != 2
            || self.rate_high_steer_factor_bp_deg.len() != 2
        {
            eyre::bail!("one_pedal rate factor breakpoints must have exactly two entries");
        }
        CurveCfg::new(
            self.speed_error_factor_bp.clone(),
            self.speed_error_factor.clone(),
        )
        .check("one_pedal.speed_error_factor", false)?;
        if !(0.0..=1.0).contains(&self.low_speed_pitch_factor_decline)
            || !(0.0..=1.0).contains(&self.low_speed_pitch_factor_incline)
        {
            eyre::bail!("one_pedal pitch factors must be in [0.0, 1.0]");
        }
        if self.min_speed < 0.0 || self.lead_accel_lockout_s < 0.0 {
            eyre::bail!("one_pedal.min_speed and lead_accel_lockout_s must be >= 0");
        }
        check_sorted("one_pedal.pid.speed_mph", &self.pid.speed_mph)?;
        let n = self.pid.speed_mph.len();
        if self.pid.kp.len() != n || self.pid.ki.len() != n || self.pid.kd.len() != n {
            eyre::bail!("one_pedal.pid gain tables must match speed_mph in length");
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Steering
        let s = &self.steering;
        if s.max <= 0 {
            eyre::bail!("steering.max must be > 0");
        }
        if s.delta_up <= 0 || s.delta_down <= 0 {
            eyre::bail!("steering.delta_up/delta_down must be > 0");
        }
        if s.delta_up > s.max || s.delta_down > s.max {
            eyre::bail!("steering deltas must not exceed steering.max");
        }
        if s.driver_allowance < 0 || s.driver_multiplier < 0 || s.driver_factor < 0 {
            eyre::bail!("steering driver limits must be >= 0");
        }
        if s.free_torque < 0 || s.free_torque > s.max {
            eyre::bail!("steering.free_torque must be in [0, steering.max]");
        }
        if s.min_speed_mph < 0.0 {
            eyre::bail!("steering.min_speed_mph must be >= 0");
        }

        // Longitudinal
        let l = &self.longitudinal;
        if !(l.max_acc_regen <= l.zero_gas && l.zero_gas <= l.max_gas) {
            eyre::bail!("longitudinal gas range must satisfy max_acc_regen <= zero_gas <= max_gas");
        }
        if l.max_acc_regen < 0 || l.max_brake <= 0 {
            eyre::bail!("longitudinal.max_acc_regen must be >= 0 and max_brake > 0");
        }
        if l.near_stop_brake_phase <= 0.0 {
            eyre::bail!("longitudinal.near_stop_brake_phase must be > 0");
        }
        if !(l.gas_pressed_threshold > 0.0 && l.gas_pressed_threshold <= 1.0) {
            eyre::bail!("longitudinal.gas_pressed_threshold must be in (0.0, 1.0]");
        }
        l.gas_lookup.check("longitudinal.gas_lookup", true)?;
        l.brake_lookup.check("longitudinal.brake_lookup", true)?;
        l.gas_brake_threshold
            .check("longitudinal.gas_brake_threshold", false)?;

        // One-pedal tuning
        self.one_pedal.validate()?;

        // Schedule
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
            eyre::bail!("schedule periods must be >= 1");
        }

        // Runner
        if self.runner.rate_hz == 0 {
            eyre::bail!("runner.rate_hz must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().expect("defaults are valid");
    }

    #[test]
    fn curve_accepts_pairs_and_tables() {
        #[derive(Deserialize)]
        struct W {
            a: CurveCfg,
            b: CurveCfg,
        }
        let w: W = toml::from_str(
            r#"
a = { bp = [-1.0, -0.1], v = [350.0, 0.0] }
b = [[-1.0, 350.0], [-0.1, 0.0]]
"#,
        )
        .expect("parse curves");
        assert_eq!(w.a, w.b);
    }

    #[test]
    fn check_rejects_non_monotonic_values() {
        let c = CurveCfg::new([0.0, 1.0, 2.0], [0.0, 5.0, 1.0]);
        assert!(c.check("c", true).is_err());
        assert!(c.check("c", false).is_ok());
    }
}
