use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use actuate_core::config::ControllerParams;
use actuate_core::mocks::{DeadTransport, RecordingTransport, ScriptedSource};
use actuate_core::{
    Controller, ControllerError, CycleInput, RunOptions, TuningFile, VehicleState, run,
};
use actuate_traits::{BoxError, InputSource, ManualClock};

fn controller() -> Controller {
    Controller::builder()
        .with_params(ControllerParams::default())
        .build()
        .expect("controller")
}

struct FailingSource {
    after: u64,
}

impl InputSource<CycleInput> for FailingSource {
    fn next_input(&mut self, cycle: u64) -> Result<Option<CycleInput>, BoxError> {
        if cycle >= self.after {
            Err("estimator went away".into())
        } else {
            Ok(Some(CycleInput::default()))
        }
    }
}

#[test]
fn transport_failure_maps_to_controller_error() {
    let mut c = controller();
    let mut src = ScriptedSource::repeat(CycleInput::default(), 5);
    let err = run(
        &mut c,
        &mut src,
        &mut DeadTransport,
        None,
        &ManualClock::new(),
        &RunOptions::default(),
    )
    .expect_err("bus off");
    match err.downcast_ref::<ControllerError>() {
        Some(ControllerError::Transport(msg)) => assert!(msg.contains("bus off")),
        other => panic!("expected Transport, got: {other:?}"),
    }
}

#[test]
fn input_failure_stops_the_loop() {
    let mut c = controller();
    let mut tx = RecordingTransport::default();
    let err = run(
        &mut c,
        &mut FailingSource { after: 3 },
        &mut tx,
        None,
        &ManualClock::new(),
        &RunOptions::default(),
    )
    .expect_err("input error");
    assert!(matches!(
        err.downcast_ref::<ControllerError>(),
        Some(ControllerError::Input(_))
    ));
    assert_eq!(tx.batches().len(), 3);
}

#[test]
fn max_cycles_bounds_the_run_and_paces_the_clock() {
    let mut c = controller();
    let mut src = ScriptedSource::repeat(CycleInput::default(), 1_000);
    let mut tx = RecordingTransport::default();
    let clock = ManualClock::new();
    let opts = RunOptions {
        rate_hz: 100,
        max_cycles: Some(250),
        shutdown: Some(Arc::new(AtomicBool::new(false))),
    };
    let stats = run(&mut c, &mut src, &mut tx, None, &clock, &opts).expect("run");
    assert_eq!(stats.cycles, 250);
    assert_eq!(src.remaining(), 750);
    assert_eq!(clock.elapsed(), Duration::from_millis(2_500));
    assert_eq!(stats.frames, tx.frames().count() as u64);
}

#[test]
fn resume_button_latch_survives_until_dashboard_frame() {
    // Standstill without stopping intent in stop-and-go mode presses resume
    // on the longitudinal step; the dashboard frame in the same cycle carries it.
    let input = CycleInput {
        engaged: true,
        state: VehicleState {
            v_ego: 0.0,
            standstill: true,
            do_stop_and_go: true,
            ..VehicleState::default()
        },
        request: actuate_core::ActuatorRequest {
            accel: 1.0,
            accel_pitch_compensated: 1.0,
            steer: 0.0,
        },
        ..CycleInput::default()
    };
    let mut c = controller();
    let mut src = ScriptedSource::repeat(input, 4);
    let mut tx = RecordingTransport::default();
    run(&mut c, &mut src, &mut tx, None, &ManualClock::new(), &RunOptions::default())
        .expect("run");
    let pressed = tx
        .frames()
        .filter_map(|f| match f.message {
            actuate_core::Message::AccDashboard { resume_button, .. } => Some(resume_button),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(pressed, vec![true]);
}

#[test]
fn tuning_file_reload_takes_effect_on_cadence() {
    let mut f = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(f, "[one_pedal]\nrate_ramp_up = 0.4\nrate_ramp_down = 0.6").expect("write");
    let mut tuning = TuningFile::new(f.path());

    let mut c = controller();
    let mut src = ScriptedSource::repeat(CycleInput::default(), 60);
    let mut tx = RecordingTransport::default();
    let stats = run(
        &mut c,
        &mut src,
        &mut tx,
        Some(&mut tuning),
        &ManualClock::new(),
        &RunOptions::default(),
    )
    .expect("run");
    assert_eq!(stats.reloads, 1);
    assert_eq!(stats.reload_failures, 0);
    assert!((c.tuning().rate_up - 0.4).abs() < 1e-6);
    assert!((c.tuning().rate_down - 0.6).abs() < 1e-6);
}
