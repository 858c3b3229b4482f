//! HUD brake-percentage indicator.
//!
//! 0..49 % shows regen (battery wattage or regen command), 51..100 % shows
//! friction braking (commanded or pedal).

use crate::config::LongitudinalParams;
use crate::curve::interp;
use crate::longitudinal::GAS_RELEASED_EPS;
use crate::state::VehicleState;

const MIN_SPEED: f32 = 0.1;
const REGEN_RANGE: [f32; 2] = [0.0, 49.0];
const FRICTION_RANGE: [f32; 2] = [51.0, 100.0];
const PEDAL_BP: [f32; 2] = [0.0, 0.5];
/// Commanded brake above this counts as friction braking.
const BRAKE_SHOWN_ABOVE: i32 = 1;

fn wattage(s: &VehicleState) -> f32 {
    interp(s.hvb_wattage, &s.hvb_wattage_bp, &REGEN_RANGE)
}

fn pedal(s: &VehicleState) -> f32 {
    interp(s.pedal_brake, &PEDAL_BP, &FRICTION_RANGE)
}

/// Brake percentage for the final `gas`/`brake` commands of this cycle.
pub fn brake_percent(
    s: &VehicleState,
    p: &LongitudinalParams,
    gas: i32,
    brake: i32,
    lead_braking_active: bool,
) -> f32 {
    if s.v_ego <= MIN_SPEED {
        return if s.pedal_brake > 0.0 { pedal(s) } else { 0.0 };
    }
    if s.cruise_enabled || s.one_pedal.active || lead_braking_active {
        if s.gas >= GAS_RELEASED_EPS {
            return wattage(s);
        }
        if brake > BRAKE_SHOWN_ABOVE {
            let range = [p.brake_lookup.min_value(), p.brake_lookup.max_value()];
            interp(brake as f32, &range, &FRICTION_RANGE)
        } else if s.one_pedal.active {
            wattage(s)
        } else if gas < p.zero_gas {
            let range = [p.max_acc_regen as f32, p.zero_gas as f32];
            interp(gas as f32, &range, &[REGEN_RANGE[1], REGEN_RANGE[0]])
        } else {
            0.0
        }
    } else if s.is_ev && s.pedal_brake == 0.0 {
        wattage(s)
    } else if s.pedal_brake > 0.0 {
        pedal(s)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cruising(v_ego: f32) -> VehicleState {
        VehicleState {
            v_ego,
            cruise_enabled: true,
            ..VehicleState::default()
        }
    }

    #[test]
    fn stopped_without_pedal_is_zero() {
        let p = LongitudinalParams::default();
        assert_eq!(brake_percent(&cruising(0.05), &p, 1404, 350, false), 0.0);
    }

    #[test]
    fn stopped_with_pedal_uses_pedal_range() {
        let p = LongitudinalParams::default();
        let s = VehicleState {
            pedal_brake: 0.25,
            ..cruising(0.0)
        };
        assert!((brake_percent(&s, &p, 1404, 0, false) - 75.5).abs() < 1e-4);
    }

    #[test]
    fn friction_brake_maps_into_upper_half() {
        let p = LongitudinalParams::default();
        assert_eq!(brake_percent(&cruising(10.0), &p, 1404, 350, false), 100.0);
        let mid = brake_percent(&cruising(10.0), &p, 1404, 175, false);
        assert!((51.0..=100.0).contains(&mid));
    }

    #[test]
    fn regen_maps_into_lower_half() {
        let p = LongitudinalParams::default();
        assert_eq!(brake_percent(&cruising(10.0), &p, 1404, 0, false), 49.0);
        assert_eq!(brake_percent(&cruising(10.0), &p, 2048, 0, false), 0.0);
        let mid = brake_percent(&cruising(10.0), &p, 1726, 0, false);
        assert!((0.0..=49.0).contains(&mid));
    }

    #[test]
    fn ev_without_pedal_shows_wattage() {
        let p = LongitudinalParams::default();
        let s = VehicleState {
            v_ego: 10.0,
            hvb_wattage: 30_000.0,
            ..VehicleState::default()
        };
        assert!((brake_percent(&s, &p, 1404, 0, false) - 24.5).abs() < 1e-3);
    }
}
