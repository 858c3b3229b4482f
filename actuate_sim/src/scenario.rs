//! Scripted drivers and planners feeding the controller from the plant.

use crate::SharedPlant;
use crate::error::SimError;
use crate::plant::Plant;
use actuate_config::Scenario;
use actuate_core::config::{ACCELERATION_DUE_TO_GRAVITY, DT_CTRL, MS_TO_KPH};
use actuate_core::runner::CycleInput;
use actuate_core::state::{ActuatorRequest, DriveMode, Gear, HudParams, Lead, PlanSource, VehicleState};
use actuate_traits::{BoxError, InputSource};

/// Cruise set speed for the cruise scenario (m/s).
const CRUISE_SET_SPEED: f32 = 25.0;
/// Temporary slowdown target inside the cruise scenario (m/s).
const CRUISE_SLOWDOWN_SPEED: f32 = 18.0;
const CRUISE_SLOWDOWN_S: (f32, f32) = (10.0, 14.0);
const CRUISE_HILL_S: (f32, f32) = (20.0, 30.0);
const CRUISE_HILL_PITCH: f32 = 0.03;
/// Stopped lead distance at start and desired final gap (m).
const LEAD_START_GAP: f32 = 80.0;
const LEAD_STOP_GAP: f32 = 5.0;
/// Below this speed the lead-stop planner just asks for a firm stop (m/s).
const LEAD_CREEP_SPEED: f32 = 1.0;
/// Auto-hold dwell requirement used by the one-pedal scenario (s).
const AUTO_HOLD_MIN_DWELL: f32 = 1.0;

#[inline]
fn clip(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}

/// Initial speed for a scenario (m/s).
pub fn initial_speed(scenario: Scenario) -> f32 {
    match scenario {
        Scenario::Cruise => 22.0,
        Scenario::OnePedal => 12.0,
        Scenario::LeadStop => 15.0,
    }
}

/// Planner accel and the pitch-compensated variant the controller expects.
fn request(accel: f32, pitch: f32, steer: f32) -> ActuatorRequest {
    ActuatorRequest {
        accel,
        accel_pitch_compensated: accel + ACCELERATION_DUE_TO_GRAVITY * pitch.sin(),
        steer,
    }
}

pub struct ScenarioSource {
    scenario: Scenario,
    plant: SharedPlant,
}

impl ScenarioSource {
    pub fn new(scenario: Scenario, plant: SharedPlant) -> Self {
        Self { scenario, plant }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    fn base_state(p: &Plant, engaged: bool) -> VehicleState {
        VehicleState {
            v_ego: p.v,
            a_ego: p.a,
            pitch: p.pitch,
            steering_angle_deg: p.steering_angle_deg,
            steering_counter: p.echo,
            standstill: p.is_stopped(),
            long_active: engaged,
            cruise_enabled: engaged,
            lkas_active: engaged && p.v > 3.0,
            ..VehicleState::default()
        }
    }

    fn cruise(t: f32, p: &mut Plant) -> CycleInput {
        p.pitch = if (CRUISE_HILL_S.0..CRUISE_HILL_S.1).contains(&t) {
            CRUISE_HILL_PITCH
        } else {
            0.0
        };
        let target = if (CRUISE_SLOWDOWN_S.0..CRUISE_SLOWDOWN_S.1).contains(&t) {
            CRUISE_SLOWDOWN_SPEED
        } else {
            CRUISE_SET_SPEED
        };
        let accel = clip(0.3 * (target - p.v), -1.5, 1.0);
        let mut state = Self::base_state(p, true);
        state.coasting.enabled = true;
        state.coasting.v_cruise_kph = CRUISE_SET_SPEED * MS_TO_KPH;
        state.coasting.plan_source = PlanSource::Cruise;
        CycleInput {
            engaged: true,
            state,
            request: request(accel, p.pitch, 0.3 * (0.2 * t).sin()),
            hud: HudParams {
                v_cruise: CRUISE_SET_SPEED,
                show_lanes: true,
                show_car: false,
                ..HudParams::default()
            },
        }
    }

    fn one_pedal(t: f32, p: &Plant) -> CycleInput {
        let mut state = Self::base_state(p, false);
        state.gear = Gear::Low;
        state.drive_mode = DriveMode::Low;
        state.one_pedal.active = true;
        state.auto_hold.enabled = true;
        state.auto_hold.available = true;
        state.auto_hold.dwell_autohold_s = t;
        state.auto_hold.dwell_one_pedal_s = t;
        state.auto_hold.min_dwell_s = AUTO_HOLD_MIN_DWELL;
        CycleInput {
            engaged: false,
            state,
            request: request(0.0, p.pitch, 0.0),
            hud: HudParams::default(),
        }
    }

    fn lead_stop(p: &Plant) -> CycleInput {
        let gap = LEAD_START_GAP - p.odometer as f32;
        let room = gap - LEAD_STOP_GAP;
        let accel = if room > 0.5 && p.v > LEAD_CREEP_SPEED {
            clip(-(p.v * p.v) / (2.0 * room), -3.0, 0.0)
        } else {
            -1.0
        };
        let mut state = Self::base_state(p, true);
        state.lead = Some(Lead {
            distance: gap.max(0.1),
            velocity: 0.0,
        });
        state.coasting.plan_source = PlanSource::Lead0;
        CycleInput {
            engaged: true,
            state,
            request: request(accel, p.pitch, 0.0),
            hud: HudParams {
                v_cruise: CRUISE_SET_SPEED,
                show_lanes: true,
                show_car: true,
                ..HudParams::default()
            },
        }
    }
}

impl InputSource<CycleInput> for ScenarioSource {
    fn next_input(&mut self, cycle: u64) -> Result<Option<CycleInput>, BoxError> {
        let mut p = self.plant.try_borrow_mut().map_err(|_| SimError::Busy)?;
        if cycle > 0 {
            p.step(cycle, DT_CTRL)?;
        }
        let t = cycle as f32 * DT_CTRL;
        let input = match self.scenario {
            Scenario::Cruise => Self::cruise(t, &mut p),
            Scenario::OnePedal => Self::one_pedal(t, &p),
            Scenario::LeadStop => Self::lead_stop(&p),
        };
        Ok(Some(input))
    }
}
