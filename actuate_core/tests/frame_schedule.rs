// Frame cadence, rolling counters and LKA icon debounce as seen on the bus.
use actuate_core::config::ControllerParams;
use actuate_core::{ActuatorRequest, CanBus, Controller, HudParams, Message, VehicleState, VisualAlert};
use rstest::rstest;

fn controller() -> Controller {
    Controller::builder()
        .with_params(ControllerParams::default())
        .build()
        .expect("controller")
}

/// (cycle, name, counter) for every frame of a quiet, disengaged run.
fn trace(cycles: u64) -> Vec<(u64, &'static str, u8)> {
    let mut c = controller();
    let mut s = VehicleState::default();
    let req = ActuatorRequest::default();
    let hud = HudParams::default();
    let mut out = Vec::new();
    for cycle in 0..cycles {
        for f in c.update(cycle, false, &mut s, &req, &hud) {
            if f.message.name() == "steering_control" {
                s.steering_counter = f.counter;
            }
            out.push((cycle, f.message.name(), f.counter));
        }
    }
    out
}

#[rstest]
#[case("friction_brake", 4)]
#[case("gas_regen", 4)]
#[case("acc_dashboard", 4)]
#[case("adas_time", 10)]
#[case("adas_accel_speed", 2)]
#[case("adas_keepalive", 100)]
fn periodic_frames_follow_their_period(#[case] name: &str, #[case] period: u64) {
    let cycles: Vec<u64> = trace(200)
        .into_iter()
        .filter(|(_, n, _)| *n == name)
        .map(|(c, _, _)| c)
        .collect();
    let expected: Vec<u64> = (0..200)
        .step_by(period as usize)
        .flat_map(|c| {
            if name == "adas_keepalive" {
                vec![c, c]
            } else {
                vec![c]
            }
        })
        .collect();
    assert_eq!(cycles, expected);
}

#[test]
fn longitudinal_counter_rolls_every_fourth_cycle() {
    let counters: Vec<u8> = trace(40)
        .into_iter()
        .filter(|(_, n, _)| *n == "friction_brake")
        .map(|(_, _, k)| k)
        .collect();
    assert_eq!(counters, vec![0, 1, 2, 3, 0, 1, 2, 3, 0, 1]);
}

#[rstest]
#[case("acc_dashboard", 4)]
#[case("adas_time", 10)]
#[case("adas_headlights", 10)]
#[case("adas_steering_status", 2)]
#[case("lka_icon", 100)]
fn periodic_counters_roll_with_their_period(#[case] name: &str, #[case] period: u64) {
    for (cycle, _, counter) in trace(400).into_iter().filter(|(_, n, _)| *n == name) {
        assert_eq!(u64::from(counter), (cycle / period) % 4, "{name} at cycle {cycle}");
    }
}

#[test]
fn keepalive_pair_shares_one_counter() {
    let counters: Vec<u8> = trace(400)
        .into_iter()
        .filter(|(_, n, _)| *n == "adas_keepalive")
        .map(|(_, _, k)| k)
        .collect();
    assert_eq!(counters, vec![0, 0, 1, 1, 2, 2, 3, 3]);
}

#[test]
fn steering_counter_follows_the_echo() {
    let counters: Vec<u8> = trace(20)
        .into_iter()
        .filter(|(_, n, _)| *n == "steering_control")
        .map(|(_, _, k)| k)
        .collect();
    assert_eq!(counters, vec![1, 2, 3, 0, 1, 2, 3, 0, 1, 2]);
}

#[test]
fn stale_echo_skips_steering() {
    let mut c = controller();
    let mut s = VehicleState::default();
    let req = ActuatorRequest::default();
    let hud = HudParams::default();
    let steering = |frames: Vec<actuate_core::CanCommand>| {
        frames
            .into_iter()
            .filter(|f| f.message.name() == "steering_control")
            .count()
    };
    assert_eq!(steering(c.update(0, false, &mut s, &req, &hud)), 1);
    // Echo never advances: nothing more is sent.
    assert_eq!(steering(c.update(2, false, &mut s, &req, &hud)), 0);
    assert_eq!(steering(c.update(4, false, &mut s, &req, &hud)), 0);
    s.steering_counter = 1;
    assert_eq!(steering(c.update(6, false, &mut s, &req, &hud)), 1);
}

#[test]
fn lka_icon_goes_out_on_edges_and_keepalive() {
    let mut c = controller();
    let mut s = VehicleState {
        v_ego: 20.0,
        ..VehicleState::default()
    };
    let hud = HudParams {
        alert: VisualAlert::SteerRequired,
        ..HudParams::default()
    };
    let mut icons = Vec::new();
    for cycle in 0..220u64 {
        s.lkas_active = (50..150).contains(&cycle);
        let steer = if (80..90).contains(&cycle) { 0.95 } else { 0.1 };
        let req = ActuatorRequest {
            steer,
            ..ActuatorRequest::default()
        };
        for f in c.update(cycle, true, &mut s, &req, &hud) {
            if let Message::LkaIcon {
                active,
                critical,
                steer_alert,
            } = f.message
            {
                assert_eq!(f.bus, CanBus::SwGmlan);
                assert!(steer_alert);
                icons.push((cycle, active, critical));
            }
            if f.message.name() == "steering_control" {
                s.steering_counter = f.counter;
            }
        }
    }
    assert_eq!(
        icons,
        vec![
            (0, false, false),
            (50, true, false),
            (80, true, true),
            (90, true, false),
            (100, true, false),
            (150, false, false),
            (200, false, false),
        ]
    );
}
