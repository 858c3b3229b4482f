//! Outbound bus commands. Byte encoding is left to the transport.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CanBus {
    Powertrain = 0,
    Obstacle = 1,
    Chassis = 2,
    SwGmlan = 3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    SteeringControl {
        torque: i32,
        active: bool,
    },
    GasRegen {
        gas: i32,
        acc_engaged: bool,
        at_full_stop: bool,
    },
    FrictionBrake {
        brake: i32,
        near_stop: bool,
        at_full_stop: bool,
    },
    AccDashboard {
        engaged: bool,
        set_speed_kph: f32,
        lead_visible: bool,
        follow_level: u8,
        fcw: bool,
        resume_button: bool,
    },
    /// Time since start in 1/60 s ticks.
    AdasTime {
        ticks: u32,
    },
    AdasHeadlights,
    AdasSteeringStatus,
    AdasAccelSpeed {
        speed: f32,
    },
    /// The keepalive is a pair of frames; `index` selects which one.
    AdasKeepalive {
        index: u8,
    },
    LkaIcon {
        active: bool,
        critical: bool,
        steer_alert: bool,
    },
}

impl Message {
    /// Frame id on the target bus.
    pub fn address(&self) -> u32 {
        match self {
            Self::SteeringControl { .. } => 0x180,
            Self::GasRegen { .. } => 0x2CB,
            Self::FrictionBrake { .. } => 0x315,
            Self::AccDashboard { .. } => 0x370,
            Self::AdasTime { .. } => 0xA1,
            Self::AdasHeadlights => 0x310,
            Self::AdasSteeringStatus => 0x306,
            Self::AdasAccelSpeed { .. } => 0x308,
            Self::AdasKeepalive { index: 0 } => 0x409,
            Self::AdasKeepalive { .. } => 0x40A,
            Self::LkaIcon { .. } => 0x104C_006C,
        }
    }

    /// Short stable name, used in logs and JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SteeringControl { .. } => "steering_control",
            Self::GasRegen { .. } => "gas_regen",
            Self::FrictionBrake { .. } => "friction_brake",
            Self::AccDashboard { .. } => "acc_dashboard",
            Self::AdasTime { .. } => "adas_time",
            Self::AdasHeadlights => "adas_headlights",
            Self::AdasSteeringStatus => "adas_steering_status",
            Self::AdasAccelSpeed { .. } => "adas_accel_speed",
            Self::AdasKeepalive { .. } => "adas_keepalive",
            Self::LkaIcon { .. } => "lka_icon",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanCommand {
    pub bus: CanBus,
    /// Rolling counter in 0..4; 0 for frames that carry none.
    pub counter: u8,
    pub message: Message,
}

impl CanCommand {
    pub fn new(bus: CanBus, counter: u8, message: Message) -> Self {
        Self {
            bus,
            counter,
            message,
        }
    }

    #[inline]
    pub fn address(&self) -> u32 {
        self.message.address()
    }
}
