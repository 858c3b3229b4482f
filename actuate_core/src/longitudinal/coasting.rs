//! Speed-limit aware coasting. Engaged cruise only.

use crate::config::{KPH_TO_MS, LongitudinalParams};
use crate::curve::interp;
use crate::longitudinal::lockout::LockoutFactors;
use crate::state::{OverSpeedBand, VehicleState};

/// Target speed in m/s: the active speed limit when below the set speed,
/// otherwise the set speed.
pub fn check_speed(s: &VehicleState) -> f32 {
    let c = &s.coasting;
    let kph = if c.speed_limit_active && c.speed_limit_kph < c.v_cruise_kph {
        c.speed_limit_kph
    } else {
        c.v_cruise_kph
    };
    kph * KPH_TO_MS
}

/// 0 at or below the band's low ratio, 1 at or above the high ratio.
pub fn over_speed_factor(s: &VehicleState, band: &OverSpeedBand, check_speed: f32) -> f32 {
    if check_speed > 0.0 && s.coasting.brake_over_speed_enabled {
        interp(s.v_ego / check_speed, &band.at(s.v_ego), &[0.0, 1.0])
    } else {
        0.0
    }
}

/// Blend gas and brake toward coasting in place.
pub fn apply(
    s: &VehicleState,
    p: &LongitudinalParams,
    f: LockoutFactors,
    gas: &mut f32,
    brake: &mut f32,
) {
    let c = &s.coasting;
    let zero_gas = p.zero_gas as f32;
    if c.enabled && f.brake < 1.0 && !s.slippery_roads && !s.low_visibility {
        if !(c.plan_source.is_coast_source() && (*gas < zero_gas || *brake > 0.0)) {
            return;
        }
        let check = check_speed(s);
        if *brake > 0.0 {
            let over = over_speed_factor(s, &c.brake_band, check);
            *brake = (*brake * f.brake).max(*brake * over);
        }
        if *gas < zero_gas && f.gas < 1.0 {
            let over = over_speed_factor(s, &c.regen_band, check);
            let coast_gas = (zero_gas - over * (zero_gas - *gas)).round();
            *gas = *gas * f.gas + coast_gas * (1.0 - f.gas);
        }
    } else if s.no_friction_braking
        && f.brake < 1.0
        && c.plan_source.is_coast_source()
        && *brake > 0.0
    {
        *brake *= f.brake;
    }
}
