// End-to-end cycles through `Controller::update` for the reference driving
// situations.
use actuate_core::config::ControllerParams;
use actuate_core::curve::Curve;
use actuate_core::longitudinal::{LockoutFactors, LongitudinalContext, LongitudinalGenerator};
use actuate_core::{
    ActuatorRequest, CanCommand, Controller, DriveMode, Gear, HudParams, Lead, LongitudinalParams,
    Message, OnePedalTuning, VehicleState,
};
use rstest::rstest;

fn controller() -> Controller {
    Controller::builder()
        .with_params(ControllerParams::default())
        .build()
        .expect("controller")
}

fn request(accel: f32, accel_pitch_compensated: f32) -> ActuatorRequest {
    ActuatorRequest {
        accel,
        accel_pitch_compensated,
        steer: 0.0,
    }
}

fn find<'a>(frames: &'a [CanCommand], name: &str) -> Option<&'a Message> {
    frames
        .iter()
        .find(|f| f.message.name() == name)
        .map(|f| &f.message)
}

fn brake_frame(frames: &[CanCommand]) -> (i32, bool, bool) {
    match find(frames, "friction_brake") {
        Some(Message::FrictionBrake {
            brake,
            near_stop,
            at_full_stop,
        }) => (*brake, *near_stop, *at_full_stop),
        other => panic!("expected friction brake frame, got {other:?}"),
    }
}

fn gas_frame(frames: &[CanCommand]) -> i32 {
    match find(frames, "gas_regen") {
        Some(Message::GasRegen { gas, .. }) => *gas,
        other => panic!("expected gas frame, got {other:?}"),
    }
}

#[test]
fn disengaged_with_brake_pedal_holds_min_regen_and_no_torque() {
    let p = LongitudinalParams::default();
    let mut c = controller();
    let mut s = VehicleState {
        v_ego: 15.0,
        brake_pressed: true,
        pedal_brake: 0.3,
        ..VehicleState::default()
    };
    let req = ActuatorRequest {
        steer: 0.8,
        ..request(-1.5, -1.5)
    };
    let frames = c.update(0, false, &mut s, &req, &HudParams::default());

    assert_eq!(gas_frame(&frames), p.max_acc_regen);
    assert_eq!(brake_frame(&frames).0, 0);
    assert_eq!(s.feedback.brake_cmd, 0);
    let steer = frames
        .iter()
        .find(|f| f.message.name() == "steering_control")
        .expect("disengaged cycles still send a steering frame");
    assert_eq!(
        steer.message,
        Message::SteeringControl {
            torque: 0,
            active: false
        }
    );
    assert_eq!(steer.counter, (s.steering_counter + 1) % 4);
}

#[test]
fn engaged_without_lead_uses_baseline_brake() {
    let mut c = controller();
    let mut s = VehicleState {
        v_ego: 15.0,
        ..VehicleState::default()
    };
    // Above 10 m/s the brake lookup uses the pitch-compensated accel only:
    // interp(-0.3, [-1.0, -0.1], [350, 0]) = 77.8
    let req = request(-0.2, -0.3);
    let frames = c.update(0, true, &mut s, &req, &HudParams::default());
    assert_eq!(brake_frame(&frames), (78, false, false));
    assert_eq!(s.feedback.brake_cmd, 78);
    assert!(!s.feedback.lead_braking_active);
    assert_eq!(c.one_pedal_decel(), 0.0);

    let mut g = LongitudinalGenerator::new(
        &LongitudinalParams::default(),
        &OnePedalTuning::default(),
        25.0,
    );
    let out = g.step(
        &LongitudinalContext {
            t: 0.0,
            dt: 0.04,
            engaged: true,
            state: &s,
            request: &req,
        },
        &LongitudinalParams::default(),
        &OnePedalTuning::default(),
    );
    assert_eq!(out.lockout, LockoutFactors::UNALTERED);
    assert_eq!(out.brake, 78);
}

#[test]
fn one_pedal_decel_moves_toward_measured_within_rate_limit() {
    let tuning = OnePedalTuning {
        decel: Curve::constant(-1.0),
        max_decel: -1.0,
        ..OnePedalTuning::default()
    };
    let mut c = Controller::builder()
        .with_params(ControllerParams::default())
        .with_tuning(tuning.clone())
        .build()
        .expect("controller");
    let hud = HudParams::default();
    let req = ActuatorRequest::default();

    // Loop inactive: the decel is pinned to the measured accel.
    let mut s = VehicleState {
        v_ego: 10.0,
        a_ego: -0.3,
        gear: Gear::Low,
        drive_mode: DriveMode::Low,
        ..VehicleState::default()
    };
    c.update(0, false, &mut s, &req, &hud);
    assert!((c.one_pedal_decel() - (-0.3)).abs() < 1e-6);

    s.one_pedal.active = true;
    s.a_ego = -0.9;
    for cycle in 1..=4 {
        c.update(cycle, false, &mut s, &req, &hud);
    }
    let d = c.one_pedal_decel();
    let step = -0.3 - d;
    assert!(step > 0.0, "decel should move toward -0.9, got {d}");
    assert!(step <= tuning.rate_up * 0.04 + 1e-5, "step {step}");
    assert!(d >= -1.0 && d >= -0.9);
}

#[test]
fn closing_lead_locks_out_coasting() {
    let p = LongitudinalParams::default();
    let mut s = VehicleState {
        v_ego: 10.0,
        lead: Some(Lead {
            distance: 10.0,
            velocity: 0.0,
        }),
        ..VehicleState::default()
    };
    s.coasting.enabled = true;
    s.coasting.v_cruise_kph = 100.0;
    let req = request(-0.5, -0.5);

    let mut g = LongitudinalGenerator::new(&p, &OnePedalTuning::default(), 25.0);
    let out = g.step(
        &LongitudinalContext {
            t: 0.0,
            dt: 0.04,
            engaged: true,
            state: &s,
            request: &req,
        },
        &p,
        &OnePedalTuning::default(),
    );
    // ttc = 1 s, inside both tables' innermost breakpoint.
    assert_eq!(out.lockout.gas, 1.0);
    assert_eq!(out.lockout.brake, 1.0);
    assert_eq!(out.brake, p.brake_lookup.eval(-0.5).round() as i32);

    let mut c = controller();
    let frames = c.update(0, true, &mut s, &req, &HudParams::default());
    assert_eq!(brake_frame(&frames).0, 156);
}

#[rstest]
#[case::engaged(true)]
#[case::lead_braking(false)]
fn full_stop_forces_max_brake(#[case] engaged: bool) {
    let p = LongitudinalParams::default();
    let mut c = controller();
    let mut s = VehicleState {
        v_ego: 0.0,
        standstill: true,
        lead_braking_enabled: !engaged,
        long_active: !engaged,
        ..VehicleState::default()
    };
    let frames = c.update(0, engaged, &mut s, &request(-0.3, -0.3), &HudParams::default());
    assert_eq!(brake_frame(&frames), (p.max_brake, true, true));
    assert_eq!(gas_frame(&frames), p.max_acc_regen);
    assert_eq!(s.feedback.brake_cmd, p.max_brake);
}

#[test]
fn replay_is_bit_identical() {
    let script: Vec<(bool, VehicleState, ActuatorRequest)> = (0..400u32)
        .map(|i| {
            let t = i as f32 * 0.01;
            let s = VehicleState {
                v_ego: 20.0 - t * 2.0,
                a_ego: -0.5 + (t * 3.0).sin() * 0.2,
                steering_counter: ((i / 2) % 4) as u8,
                lkas_active: i % 50 < 25,
                lead: (i > 100).then_some(Lead {
                    distance: 40.0 - t * 5.0,
                    velocity: 8.0,
                }),
                ..VehicleState::default()
            };
            let r = ActuatorRequest {
                accel: (t * 1.3).cos() - 0.5,
                accel_pitch_compensated: (t * 1.3).cos() - 0.6,
                steer: (t * 0.7).sin(),
            };
            (i % 300 < 250, s, r)
        })
        .collect();

    let replay = || {
        let mut c = controller();
        script
            .iter()
            .enumerate()
            .map(|(cycle, (engaged, s, r))| {
                let mut s = s.clone();
                let frames = c.update(cycle as u64, *engaged, &mut s, r, &HudParams::default());
                (frames, s.feedback)
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(replay(), replay());
}
