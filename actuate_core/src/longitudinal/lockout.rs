//! Lead-vehicle lockout factors.
//!
//! 1.0 leaves cruise braking and regen untouched; 0.0 lets the coasting
//! policy fully replace them.

use crate::curve::Curve;
use crate::state::{Lead, LockoutCurves, LockoutTable};

const TTC_CAP: f32 = 100.0;
const D_TIME_DEFAULT: f32 = 10.0;

/// Lead kinematics fed to every lockout curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockoutInputs {
    pub ttc: f32,
    pub v_rel: f32,
    pub lead_v: f32,
    pub headway_ratio: f32,
    pub distance: f32,
}

impl LockoutInputs {
    pub fn from_lead(lead: &Lead, v_ego: f32, time_headway: f32) -> Self {
        let d = lead.distance;
        let v_rel = lead.velocity - v_ego;
        let ttc = if d > 0.0 && v_rel < 0.0 {
            (-d / v_rel).min(TTC_CAP)
        } else {
            TTC_CAP
        };
        let d_time = if d > 0.0 && v_ego > 0.0 && time_headway > 0.0 {
            d / v_ego
        } else {
            D_TIME_DEFAULT
        };
        let headway_ratio = if time_headway > 0.0 {
            d_time / time_headway
        } else {
            f32::INFINITY
        };
        Self {
            ttc,
            v_rel,
            lead_v: lead.velocity,
            headway_ratio,
            distance: d,
        }
    }
}

impl LockoutTable {
    /// (curve, input) pairs the table is reduced over.
    fn pairs(&self, inp: &LockoutInputs) -> [(&Curve, f32); 5] {
        [
            (&self.v_rel, inp.v_rel),
            (&self.lead_v, inp.lead_v),
            (&self.ttc, inp.ttc),
            (&self.headway_ratio, inp.headway_ratio),
            (&self.distance, inp.distance),
        ]
    }

    /// Any input is inside its curve's active range.
    pub fn triggered(&self, inp: &LockoutInputs) -> bool {
        self.pairs(inp).iter().any(|(c, x)| *x < c.last_bp())
    }

    /// Most conservative (largest) factor across the curves.
    pub fn factor(&self, inp: &LockoutInputs) -> f32 {
        self.pairs(inp)
            .iter()
            .map(|(c, x)| c.eval(*x))
            .fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockoutFactors {
    pub gas: f32,
    pub brake: f32,
}

impl LockoutFactors {
    pub const UNALTERED: Self = Self {
        gas: 1.0,
        brake: 1.0,
    };
}

/// Gas and brake lockout factors for the current lead. The brake table is
/// only consulted when the gas table triggered.
pub fn lockout_factors(
    curves: &LockoutCurves,
    lead: Option<&Lead>,
    v_ego: f32,
    time_headway: f32,
) -> LockoutFactors {
    let Some(lead) = lead.filter(|l| l.distance > 0.0) else {
        return LockoutFactors::UNALTERED;
    };
    let inp = LockoutInputs::from_lead(lead, v_ego, time_headway);
    if !curves.gas.triggered(&inp) {
        return LockoutFactors {
            gas: 0.0,
            brake: 0.0,
        };
    }
    let gas = curves.gas.factor(&inp);
    let brake = if curves.brake.triggered(&inp) {
        curves.brake.factor(&inp)
    } else {
        0.0
    };
    LockoutFactors { gas, brake }
}
