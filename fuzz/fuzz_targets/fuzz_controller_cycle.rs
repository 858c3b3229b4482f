#![no_main]
use actuate_core::{
    ActuatorRequest, Controller, ControllerParams, Gear, HudParams, Lead, VehicleState,
};
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Step {
    engaged: bool,
    v_ego: f32,
    a_ego: f32,
    pitch: f32,
    steering_angle_deg: f32,
    steering_counter: u8,
    gas: f32,
    brake_pressed: bool,
    low_gear: bool,
    one_pedal: bool,
    lead: Option<(f32, f32)>,
    accel: f32,
    steer: f32,
}

// Arbitrary (even non-finite) inputs must never panic and must keep commands in range.
fuzz_target!(|steps: Vec<Step>| {
    let Ok(mut c) = Controller::builder()
        .with_params(ControllerParams::default())
        .build()
    else {
        return;
    };
    let max_steer = c.params().steer.max;
    let hud = HudParams::default();
    for (cycle, s) in steps.iter().take(512).enumerate() {
        let mut state = VehicleState {
            v_ego: s.v_ego,
            a_ego: s.a_ego,
            pitch: s.pitch,
            steering_angle_deg: s.steering_angle_deg,
            steering_counter: s.steering_counter % 4,
            gas: s.gas,
            brake_pressed: s.brake_pressed,
            gear: if s.low_gear { Gear::Low } else { Gear::Drive },
            lead: s.lead.map(|(distance, velocity)| Lead { distance, velocity }),
            ..VehicleState::default()
        };
        state.one_pedal.active = s.one_pedal;
        let req = ActuatorRequest {
            accel: s.accel,
            accel_pitch_compensated: s.accel,
            steer: s.steer,
        };
        c.update(cycle as u64, s.engaged, &mut state, &req, &hud);
        assert!(c.last_steer().abs() <= max_steer);
    }
});
