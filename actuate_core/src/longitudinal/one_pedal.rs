//! One-pedal deceleration loop.
//!
//! Tracks a speed-dependent decel profile with a PI controller, rate limits
//! the result and maps it through the brake lookup. Runs on the longitudinal
//! period only.

use crate::config::{ACCELERATION_DUE_TO_GRAVITY, OnePedalTuning};
use crate::curve::Curve;
use crate::pid::Pid;
use crate::state::DriveMode;

/// Output limits of the decel PID in m/s^2.
const PID_NEG_LIMIT: f32 = -3.5;
const PID_POS_LIMIT: f32 = 0.0;
/// Below this speed Drive with DL coasting holds zero decel-in.
const DL_COAST_MIN_SPEED: f32 = 0.05;

/// `x` bounded to `[lo, hi]`; unlike `f32::clamp` never panics on odd bounds.
#[inline]
fn clip(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnePedalInput {
    pub v_ego: f32,
    pub a_ego: f32,
    pub pitch: f32,
    pub steering_angle_deg: f32,
    pub drive_mode: DriveMode,
    pub temporary: bool,
    pub dl_coasting_enabled: bool,
    /// Gas/brake handover accel for this cycle.
    pub threshold_accel: f32,
}

#[derive(Debug, Clone)]
pub struct OnePedalLoop {
    pid: Pid,
    decel: f32,
    decel_in: f32,
    apply_brake: f32,
}

impl OnePedalLoop {
    /// `rate` is the loop update rate in Hz.
    pub fn new(t: &OnePedalTuning, rate: f32) -> Self {
        Self {
            pid: Pid::new(t.kp.clone(), t.ki.clone(), t.kd.clone(), rate)
                .with_limits(PID_NEG_LIMIT, PID_POS_LIMIT),
            decel: 0.0,
            decel_in: 0.0,
            apply_brake: 0.0,
        }
    }

    pub fn retune(&mut self, t: &OnePedalTuning) {
        self.pid.set_gains(t.kp.clone(), t.ki.clone(), t.kd.clone());
    }

    /// Anti-windup on any disqualifying transition: clear the integrator and
    /// pin both decel estimates to the measured acceleration.
    pub fn reset(&mut self, measured: f32) {
        self.pid.reset();
        self.decel = measured;
        self.decel_in = measured;
        self.apply_brake = 0.0;
    }

    pub fn decel(&self) -> f32 {
        self.decel
    }

    pub fn decel_in(&self) -> f32 {
        self.decel_in
    }

    pub fn apply_brake(&self) -> f32 {
        self.apply_brake
    }

    fn profile<'a>(t: &'a OnePedalTuning, inp: &OnePedalInput) -> &'a Curve {
        if inp.drive_mode != DriveMode::Low {
            &t.regen_paddle_decel
        } else if inp.temporary {
            &t.one_time_decel
        } else {
            &t.decel
        }
    }

    /// Advance one longitudinal step and return the friction brake command
    /// (raw device units, not yet rounded). `dt` is the step period in seconds.
    pub fn step(
        &mut self,
        t: &OnePedalTuning,
        brake_lookup: &Curve,
        inp: &OnePedalInput,
        dt: f32,
    ) -> f32 {
        let up = t.rate_up * dt;
        let down = t.rate_down * dt;

        let mut pitch_accel = inp.pitch * ACCELERATION_DUE_TO_GRAVITY;
        let pitch_factor = if pitch_accel <= 0.0 {
            &t.pitch_factor_decline
        } else {
            &t.pitch_factor_incline
        };
        pitch_accel *= pitch_factor.eval(inp.v_ego);

        if !inp.drive_mode.tracks_one_pedal_profile() {
            let target = if inp.drive_mode == DriveMode::Drive
                && inp.dl_coasting_enabled
                && inp.v_ego > DL_COAST_MIN_SPEED
            {
                0.0
            } else {
                inp.a_ego.min(inp.threshold_accel)
            };
            self.decel_in = clip(target, self.decel_in - up, self.decel_in + down);
            self.apply_brake = 0.0;
            return 0.0;
        }

        self.decel_in = Self::profile(t, inp).eval(inp.v_ego);
        let error =
            (self.decel_in - (inp.a_ego + pitch_accel).min(0.0)) * t.speed_error_factor.eval(inp.v_ego);
        let out = self
            .pid
            .update(self.decel_in, self.decel_in - error, inp.v_ego, self.decel_in);

        let f = t
            .rate_speed_factor
            .eval(inp.v_ego)
            .min(t.rate_steer_factor.eval(inp.steering_angle_deg.abs()));

        // The release side adds the raw factor on top of the unscaled rate.
        let prev = self.decel;
        let decel = clip(out, prev - up * f, prev + down + f)
            .max(t.max_decel)
            .max(inp.a_ego);

        if !decel.is_finite() {
            tracing::warn!(a_ego = inp.a_ego, "one-pedal decel not finite; resetting loop");
            self.reset(0.0);
            return 0.0;
        }
        self.decel = decel;
        self.apply_brake = brake_lookup.eval(decel);
        self.apply_brake
    }
}
