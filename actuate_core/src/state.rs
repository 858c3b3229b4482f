//! Per-cycle inputs: the vehicle-state snapshot, the actuator request and the
//! HUD parameters, plus the feedback block the engine writes back.

use crate::config::MPH_TO_MS;
use crate::curve::Curve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gear {
    Park,
    Reverse,
    Neutral,
    #[default]
    Drive,
    Low,
    Unknown,
}

impl Gear {
    /// Gears in which the engine may command gas or friction brake.
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Drive | Self::Low)
    }
}

/// EV drive mode as reported by the shifter, including the regen paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveMode {
    #[default]
    Drive,
    Low,
    RegenPaddleDrive,
    RegenPaddleLow,
    Other,
}

impl DriveMode {
    /// Modes in which the one-pedal loop tracks a decel profile.
    #[inline]
    pub fn tracks_one_pedal_profile(self) -> bool {
        matches!(
            self,
            Self::Low | Self::RegenPaddleLow | Self::RegenPaddleDrive
        )
    }
}

/// Which part of the planner produced the current longitudinal plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanSource {
    #[default]
    Cruise,
    Lead0,
    Lead1,
    Lead2,
    Stop,
    SpeedLimit,
    TurnLimit,
    Unknown,
}

impl PlanSource {
    pub fn is_brake_source(self) -> bool {
        matches!(self, Self::Lead0 | Self::Lead1 | Self::Lead2 | Self::Stop)
    }

    pub fn is_coast_source(self) -> bool {
        matches!(self, Self::Cruise | Self::SpeedLimit | Self::TurnLimit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualAlert {
    #[default]
    None,
    Fcw,
    SteerRequired,
    Ldw,
    Other,
}

/// Tracked lead vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lead {
    /// Gap in meters.
    pub distance: f32,
    /// Absolute lead speed in m/s.
    pub velocity: f32,
}

/// One set of five lockout curves. Each maps its input to a factor in [0, 1];
/// an input below the curve's last breakpoint triggers the table.
#[derive(Debug, Clone, PartialEq)]
pub struct LockoutTable {
    pub ttc: Curve,
    pub v_rel: Curve,
    pub lead_v: Curve,
    /// Input is time gap divided by the follow time headway.
    pub headway_ratio: Curve,
    pub distance: Curve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LockoutCurves {
    pub gas: LockoutTable,
    pub brake: LockoutTable,
}

impl Default for LockoutCurves {
    fn default() -> Self {
        Self {
            gas: LockoutTable {
                ttc: Curve::from_static(&[4.0, 6.0], &[1.0, 0.0]),
                v_rel: Curve::from_static(&[-5.0, -2.0], &[1.0, 0.0]),
                lead_v: Curve::from_static(&[3.0, 8.0], &[1.0, 0.0]),
                headway_ratio: Curve::from_static(&[0.8, 1.5], &[1.0, 0.0]),
                distance: Curve::from_static(&[10.0, 25.0], &[1.0, 0.0]),
            },
            brake: LockoutTable {
                ttc: Curve::from_static(&[3.0, 5.0], &[1.0, 0.0]),
                v_rel: Curve::from_static(&[-4.0, -1.5], &[1.0, 0.0]),
                lead_v: Curve::from_static(&[2.0, 6.0], &[1.0, 0.0]),
                headway_ratio: Curve::from_static(&[0.7, 1.2], &[1.0, 0.0]),
                distance: Curve::from_static(&[8.0, 20.0], &[1.0, 0.0]),
            },
        }
    }
}

/// Speed-dependent over-speed ratio band: below `lo(v)` the factor is 0,
/// above `hi(v)` it is 1.
#[derive(Debug, Clone, PartialEq)]
pub struct OverSpeedBand {
    pub lo: Curve,
    pub hi: Curve,
}

impl OverSpeedBand {
    pub fn at(&self, v_ego: f32) -> [f32; 2] {
        [self.lo.eval(v_ego), self.hi.eval(v_ego)]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoastingState {
    pub enabled: bool,
    pub brake_over_speed_enabled: bool,
    pub plan_source: PlanSource,
    pub speed_limit_active: bool,
    pub speed_limit_kph: f32,
    /// Cruise set speed in kph.
    pub v_cruise_kph: f32,
    pub brake_band: OverSpeedBand,
    pub regen_band: OverSpeedBand,
}

impl Default for CoastingState {
    fn default() -> Self {
        let bp = [20.0 * MPH_TO_MS, 80.0 * MPH_TO_MS];
        Self {
            enabled: false,
            brake_over_speed_enabled: true,
            plan_source: PlanSource::Cruise,
            speed_limit_active: false,
            speed_limit_kph: 0.0,
            v_cruise_kph: 0.0,
            brake_band: OverSpeedBand {
                lo: Curve::from_static(&bp, &[1.15, 1.07]),
                hi: Curve::from_static(&bp, &[1.35, 1.15]),
            },
            regen_band: OverSpeedBand {
                lo: Curve::from_static(&bp, &[1.0, 1.0]),
                hi: Curve::from_static(&bp, &[1.25, 1.1]),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OnePedalFlags {
    pub active: bool,
    /// One-shot stop requested from Drive.
    pub temporary: bool,
    /// Coast instead of tracking the threshold in Drive.
    pub dl_coasting_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AutoHoldState {
    /// Driver setting.
    pub enabled: bool,
    /// Car reports auto-hold can engage.
    pub available: bool,
    pub regen_paddle_pressed: bool,
    /// Seconds spent in drive since the last shift, for each entry path.
    pub dwell_autohold_s: f32,
    pub dwell_one_pedal_s: f32,
    pub min_dwell_s: f32,
}

/// Values written back by the engine every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Feedback {
    pub brake_cmd: i32,
    pub gas_cmd: i32,
    pub auto_hold_activated: bool,
    pub brake_percent: f32,
    pub resume_required: bool,
    /// Consumed by the next dashboard frame.
    pub resume_button: bool,
    pub lead_braking_active: bool,
}

/// Vehicle-state snapshot. Owned by the state estimator; the engine only
/// writes `feedback`.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub v_ego: f32,
    pub a_ego: f32,
    /// Road pitch in radians, positive uphill.
    pub pitch: f32,
    pub steering_angle_deg: f32,
    /// Driver-applied steering torque.
    pub steering_torque: f32,
    pub gear: Gear,
    pub drive_mode: DriveMode,
    /// Accelerator position in [0, 1].
    pub gas: f32,
    /// Brake pedal position in [0, 1].
    pub pedal_brake: f32,
    pub brake_pressed: bool,

    pub cruise_main: bool,
    pub cruise_enabled: bool,
    pub long_active: bool,
    pub pause_long_on_gas: bool,
    /// Lateral-only mode.
    pub mads_enabled: bool,
    pub lka_enabled: bool,
    pub steer_warning: bool,
    pub steer_error: bool,
    pub lane_change_steer_factor: f32,
    /// Last steering counter echoed back by the hardware.
    pub steering_counter: u8,
    pub lkas_active: bool,

    pub one_pedal: OnePedalFlags,
    pub lead_braking_enabled: bool,
    pub lead: Option<Lead>,
    /// Follow time headway in seconds.
    pub follow_time_headway: f32,
    pub follow_level: u8,
    pub lockout: LockoutCurves,
    pub coasting: CoastingState,
    pub slippery_roads: bool,
    pub low_visibility: bool,
    pub no_friction_braking: bool,

    /// Cruise reports standstill.
    pub standstill: bool,
    pub park_assist_active: bool,
    pub auto_hold: AutoHoldState,
    pub do_stop_and_go: bool,

    pub show_brake_indicator: bool,
    pub is_ev: bool,
    pub hvb_wattage: f32,
    /// Wattage range mapped onto the 0..49 % regen part of the indicator.
    pub hvb_wattage_bp: [f32; 2],

    pub feedback: Feedback,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            v_ego: 0.0,
            a_ego: 0.0,
            pitch: 0.0,
            steering_angle_deg: 0.0,
            steering_torque: 0.0,
            gear: Gear::Drive,
            drive_mode: DriveMode::Drive,
            gas: 0.0,
            pedal_brake: 0.0,
            brake_pressed: false,
            cruise_main: true,
            cruise_enabled: false,
            long_active: false,
            pause_long_on_gas: false,
            mads_enabled: false,
            lka_enabled: true,
            steer_warning: false,
            steer_error: false,
            lane_change_steer_factor: 1.0,
            steering_counter: 0,
            lkas_active: false,
            one_pedal: OnePedalFlags::default(),
            lead_braking_enabled: false,
            lead: None,
            follow_time_headway: 1.45,
            follow_level: 2,
            lockout: LockoutCurves::default(),
            coasting: CoastingState::default(),
            slippery_roads: false,
            low_visibility: false,
            no_friction_braking: false,
            standstill: false,
            park_assist_active: false,
            auto_hold: AutoHoldState::default(),
            do_stop_and_go: false,
            show_brake_indicator: true,
            is_ev: true,
            hvb_wattage: 0.0,
            hvb_wattage_bp: [0.0, 60_000.0],
            feedback: Feedback::default(),
        }
    }
}

impl VehicleState {
    /// Lead with a positive gap, if any.
    pub fn tracked_lead(&self) -> Option<&Lead> {
        self.lead.as_ref().filter(|l| l.distance > 0.0)
    }
}

/// Planner output for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorRequest {
    pub accel: f32,
    pub accel_pitch_compensated: f32,
    /// Normalized steering in [-1, 1].
    pub steer: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HudParams {
    /// Cruise display speed in m/s.
    pub v_cruise: f32,
    pub show_lanes: bool,
    pub show_car: bool,
    pub alert: VisualAlert,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_with_non_positive_gap_is_not_tracked() {
        let mut s = VehicleState::default();
        assert!(s.tracked_lead().is_none());
        s.lead = Some(Lead {
            distance: -1.0,
            velocity: 10.0,
        });
        assert!(s.tracked_lead().is_none());
        s.lead = Some(Lead {
            distance: 30.0,
            velocity: 10.0,
        });
        assert_eq!(s.tracked_lead().map(|l| l.distance), Some(30.0));
    }

    #[test]
    fn plan_sources_split_into_brake_and_coast() {
        assert!(PlanSource::Lead1.is_brake_source());
        assert!(!PlanSource::Lead1.is_coast_source());
        assert!(PlanSource::SpeedLimit.is_coast_source());
        assert!(!PlanSource::Unknown.is_brake_source() && !PlanSource::Unknown.is_coast_source());
    }
}
