//! Speed-scheduled PI(D) controller with feedforward and output limits.

use crate::curve::Curve;

#[derive(Debug, Clone)]
pub struct Pid {
    kp: Curve,
    ki: Curve,
    kd: Curve,
    /// Update rate in Hz.
    rate: f32,
    pub neg_limit: f32,
    pub pos_limit: f32,
    integral: f32,
    prev_error: Option<f32>,
    control: f32,
}

impl Pid {
    pub fn new(kp: Curve, ki: Curve, kd: Curve, rate: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            rate,
            neg_limit: f32::NEG_INFINITY,
            pos_limit: f32::INFINITY,
            integral: 0.0,
            prev_error: None,
            control: 0.0,
        }
    }

    pub fn with_limits(mut self, neg: f32, pos: f32) -> Self {
        self.neg_limit = neg;
        self.pos_limit = pos;
        self
    }

    /// Swap gain tables; integrator state is kept.
    pub fn set_gains(&mut self, kp: Curve, ki: Curve, kd: Curve) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.control = 0.0;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// One step. The integrator only moves when that keeps the output inside
    /// the limits or pulls it back toward them.
    pub fn update(&mut self, setpoint: f32, measurement: f32, speed: f32, feedforward: f32) -> f32 {
        let error = setpoint - measurement;
        let p = error * self.kp.eval(speed);
        let d = match self.prev_error {
            Some(prev) => (error - prev) * self.rate * self.kd.eval(speed),
            None => 0.0,
        };
        self.prev_error = Some(error);

        let i = self.integral + error * self.ki.eval(speed) / self.rate;
        let unwound = p + feedforward + i;
        if (error >= 0.0 && (unwound <= self.pos_limit || i < 0.0))
            || (error <= 0.0 && (unwound >= self.neg_limit || i > 0.0))
        {
            self.integral = i;
        }

        let control = p + feedforward + self.integral + d;
        self.control = control.clamp(self.neg_limit, self.pos_limit);
        self.control
    }
}
