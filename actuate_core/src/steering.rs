//! Steering torque generator.

use crate::config::SteerLimits;
use crate::state::{ActuatorRequest, VehicleState};

/// Standard torque limiter: driver-torque window, absolute clip, then an
/// asymmetric delta clip (`delta_up` away from zero, `delta_down` back toward
/// it). When both `last` and the clipped request lie within
/// `free_torque`, the delta clip is skipped.
pub fn apply_std_steer_torque_limits(
    requested: i32,
    last: i32,
    driver_torque: f32,
    lim: &SteerLimits,
) -> i32 {
    let max = lim.max as f32;
    let allowance = lim.driver_allowance as f32;
    let mult = lim.driver_multiplier as f32;
    let driver = driver_torque * lim.driver_factor as f32;

    let driver_max = max + (allowance + driver) * mult;
    let driver_min = -max + (-allowance + driver) * mult;
    let max_allowed = max.min(driver_max).max(0.0);
    let min_allowed = (-max).max(driver_min).min(0.0);

    let mut torque = (requested as f32).clamp(min_allowed, max_allowed);

    let free = lim.free_torque;
    let in_free_band = free > 0 && last.abs() <= free && (torque.round() as i32).abs() <= free;
    if !in_free_band {
        let last_f = last as f32;
        let up = lim.delta_up as f32;
        let down = lim.delta_down as f32;
        torque = if last > 0 {
            torque.clamp((last_f - down).max(-up), last_f + up)
        } else {
            torque.clamp(last_f - up, (last_f + down).min(up))
        };
    }
    torque.round() as i32
}

/// What to put on the wire for one steering frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteerFrame {
    pub torque: i32,
    pub active: bool,
    pub counter: u8,
}

#[derive(Debug, Default)]
pub struct SteeringGenerator {
    last_torque: i32,
    last_echo: Option<u8>,
    rate_limited: bool,
}

impl SteeringGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_torque(&self) -> i32 {
        self.last_torque
    }

    /// True when the last enabled request was altered by the limiter.
    pub fn rate_limited(&self) -> bool {
        self.rate_limited
    }

    /// Steering is allowed this cycle.
    pub fn enabled(engaged: bool, s: &VehicleState, lim: &SteerLimits) -> bool {
        (engaged || s.pause_long_on_gas || (s.mads_enabled && s.cruise_main))
            && s.lka_enabled
            && !(s.steer_warning || s.steer_error)
            && s.v_ego > lim.min_speed
            && s.lane_change_steer_factor > 0.0
    }

    /// Produce the steering frame for a steering-period cycle, or `None` when
    /// the hardware has not echoed the previous frame yet.
    pub fn update(
        &mut self,
        engaged: bool,
        s: &VehicleState,
        req: &ActuatorRequest,
        lim: &SteerLimits,
    ) -> Option<SteerFrame> {
        let echo = s.steering_counter % 4;
        if self.last_echo == Some(echo) {
            tracing::trace!(echo, "steering echo stale; skipping frame");
            return None;
        }
        self.last_echo = Some(echo);

        let active = Self::enabled(engaged, s, lim);
        let torque = if active {
            let new = (req.steer * lim.max as f32 * s.lane_change_steer_factor).round() as i32;
            let applied = apply_std_steer_torque_limits(new, self.last_torque, s.steering_torque, lim);
            self.rate_limited = new != applied;
            applied
        } else {
            0
        };
        self.last_torque = torque;

        Some(SteerFrame {
            torque,
            active,
            counter: (echo + 1) % 4,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lim() -> SteerLimits {
        SteerLimits::default()
    }

    #[test]
    fn ramps_up_by_delta_up() {
        assert_eq!(apply_std_steer_torque_limits(300, 0, 0.0, &lim()), 7);
        assert_eq!(apply_std_steer_torque_limits(300, 100, 0.0, &lim()), 107);
        assert_eq!(apply_std_steer_torque_limits(-300, -100, 0.0, &lim()), -107);
    }

    #[test]
    fn ramps_down_by_delta_down() {
        assert_eq!(apply_std_steer_torque_limits(0, 100, 0.0, &lim()), 83);
        assert_eq!(apply_std_steer_torque_limits(0, -100, 0.0, &lim()), -83);
    }

    #[test]
    fn reversal_near_zero_is_bounded_by_delta_up() {
        assert_eq!(apply_std_steer_torque_limits(-300, 5, 0.0, &lim()), -7);
        assert_eq!(apply_std_steer_torque_limits(300, -5, 0.0, &lim()), 7);
    }

    #[test]
    fn driver_torque_shrinks_the_window() {
        // Driver pushes against positive torque: max allowed = 300 + (50 - 200) * 4 < 0 → 0
        let out = apply_std_steer_torque_limits(300, 3, -2.0, &lim());
        assert_eq!(out, 0);
    }

    #[test]
    fn free_band_skips_the_delta_clip() {
        let l = SteerLimits {
            free_torque: 50,
            ..lim()
        };
        assert_eq!(apply_std_steer_torque_limits(40, 0, 0.0, &l), 40);
        assert_eq!(apply_std_steer_torque_limits(80, 0, 0.0, &l), 7);
    }

    #[test]
    fn skips_when_echo_has_not_advanced() {
        let mut g = SteeringGenerator::new();
        let s = VehicleState {
            v_ego: 20.0,
            steering_counter: 2,
            ..VehicleState::default()
        };
        let req = ActuatorRequest {
            steer: 0.5,
            ..ActuatorRequest::default()
        };
        let first = g.update(true, &s, &req, &lim()).expect("first frame");
        assert_eq!(first.counter, 3);
        assert!(first.active);
        assert!(g.update(true, &s, &req, &lim()).is_none());
        let s2 = VehicleState {
            steering_counter: 3,
            ..s
        };
        let next = g.update(true, &s2, &req, &lim()).expect("echo advanced");
        assert_eq!(next.counter, 0);
        assert_eq!(next.torque, 14);
        assert!(g.rate_limited());
    }

    #[test]
    fn disabled_below_min_speed() {
        let mut g = SteeringGenerator::new();
        let s = VehicleState {
            v_ego: 1.0,
            ..VehicleState::default()
        };
        let req = ActuatorRequest {
            steer: 1.0,
            ..ActuatorRequest::default()
        };
        let f = g.update(true, &s, &req, &lim()).expect("frame");
        assert_eq!((f.torque, f.active), (0, false));
    }
}
