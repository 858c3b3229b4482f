//! Multi-rate message scheduler.
//!
//! A message kind is due when its period divides the cycle index. Each kind
//! carries its own rolling counter `(cycle / period) % 4`.

use crate::config::SchedulePeriods;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Steering,
    Longitudinal,
    Dashboard,
    TimeHeadlights,
    SpeedYaw,
    AdasKeepalive,
    LkaIcon,
}

/// Icon state: (LKA active, torque near the limit).
pub type IconStatus = (bool, bool);

#[derive(Debug, Clone)]
pub struct Scheduler {
    periods: [(MessageKind, u64); 7],
    icon_last: IconStatus,
}

impl Scheduler {
    pub fn new(p: &SchedulePeriods) -> Self {
        let periods = [
            (MessageKind::Steering, p.steer),
            (MessageKind::Longitudinal, p.longitudinal),
            (MessageKind::Dashboard, p.longitudinal),
            (MessageKind::TimeHeadlights, p.time_headlights),
            (MessageKind::SpeedYaw, p.speed_yaw),
            (MessageKind::AdasKeepalive, p.adas_keepalive),
            (MessageKind::LkaIcon, p.camera_keepalive),
        ]
        .map(|(k, period)| (k, u64::from(period.max(1))));
        Self {
            periods,
            icon_last: (false, false),
        }
    }

    pub fn period(&self, kind: MessageKind) -> u64 {
        self.periods
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(1, |(_, p)| *p)
    }

    #[inline]
    pub fn is_due(&self, kind: MessageKind, cycle: u64) -> bool {
        cycle % self.period(kind) == 0
    }

    #[inline]
    pub fn counter(&self, kind: MessageKind, cycle: u64) -> u8 {
        ((cycle / self.period(kind)) % 4) as u8
    }

    /// The icon goes out on its keepalive period or on any change of
    /// `status`; repeated identical states do not resend it.
    pub fn lka_icon_due(&mut self, cycle: u64, status: IconStatus) -> bool {
        let due = self.is_due(MessageKind::LkaIcon, cycle) || status != self.icon_last;
        if due {
            self.icon_last = status;
        }
        due
    }
}
