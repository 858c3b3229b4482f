use actuate_core::config::ControllerParams;
use actuate_core::{Controller, ControllerError, RunOptions, StandstillPhase, run};
use actuate_sim::{Scenario, rig};
use actuate_traits::ManualClock;
use rstest::rstest;

fn controller() -> Controller {
    Controller::builder()
        .with_params(ControllerParams::default())
        .build()
        .expect("controller")
}

fn opts(cycles: u64) -> RunOptions {
    RunOptions {
        max_cycles: Some(cycles),
        ..RunOptions::default()
    }
}

#[test]
fn cruise_holds_speed_and_keeps_steering_counter_in_step() {
    let params = ControllerParams::default();
    let (mut src, mut bus, plant) = rig(Scenario::Cruise, &params);
    let mut c = controller();
    let stats = run(&mut c, &mut src, &mut bus, None, &ManualClock::new(), &opts(3_000))
        .expect("run");

    assert_eq!(stats.cycles, 3_000);
    // The plant echoes every steering frame, so none is ever skipped.
    assert_eq!(bus.counts().get("steering_control"), Some(&1_500));
    assert_eq!(bus.counts().get("friction_brake"), Some(&750));
    let v = plant.borrow().v;
    assert!((18.0..=30.0).contains(&v), "final speed {v}");
}

#[test]
fn lead_stop_ends_held_short_of_the_lead() {
    let params = ControllerParams::default();
    let (mut src, mut bus, plant) = rig(Scenario::LeadStop, &params);
    let mut c = controller();
    run(&mut c, &mut src, &mut bus, None, &ManualClock::new(), &opts(2_500)).expect("run");

    let p = plant.borrow();
    assert!(p.is_stopped());
    assert!(p.odometer < 80.0, "ran into the lead: {}", p.odometer);
    assert!(p.stopped_s > 1.0);
    assert_eq!(p.brake_cmd, params.long.max_brake);
    assert_eq!(c.phase(), StandstillPhase::FullStop);
}

#[test]
fn one_pedal_stops_and_hands_over_to_auto_hold() {
    let params = ControllerParams::default();
    let (mut src, mut bus, plant) = rig(Scenario::OnePedal, &params);
    let mut c = controller();
    run(&mut c, &mut src, &mut bus, None, &ManualClock::new(), &opts(2_000)).expect("run");

    assert!(plant.borrow().is_stopped());
    assert_eq!(c.phase(), StandstillPhase::AutoHold);
    // Auto-hold suppresses the gas frame.
    let gas = bus.counts().get("gas_regen").copied().unwrap_or(0);
    let brake = bus.counts().get("friction_brake").copied().unwrap_or(0);
    assert!(gas < brake, "gas {gas} brake {brake}");
}

#[rstest]
#[case(Scenario::Cruise)]
#[case(Scenario::OnePedal)]
#[case(Scenario::LeadStop)]
fn bus_off_surfaces_as_transport_error(#[case] scenario: Scenario) {
    let params = ControllerParams::default();
    let (mut src, bus, _plant) = rig(scenario, &params);
    let mut bus = bus.with_fail_after(100);
    let mut c = controller();
    let err = run(&mut c, &mut src, &mut bus, None, &ManualClock::new(), &opts(1_000))
        .expect_err("bus off");
    match err.downcast_ref::<ControllerError>() {
        Some(ControllerError::Transport(msg)) => assert!(msg.contains("bus is off")),
        other => panic!("expected Transport, got: {other:?}"),
    }
    assert!(bus.frames() <= 100);
}
