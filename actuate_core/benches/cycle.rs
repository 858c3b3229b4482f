use actuate_core::config::ControllerParams;
use actuate_core::{ActuatorRequest, Controller, DriveMode, Gear, HudParams, Lead, VehicleState};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn controller() -> Controller {
    Controller::builder()
        .with_params(ControllerParams::default())
        .build()
        .expect("controller")
}

// Synthetic drive: sinusoidal accel/steer requests with a slowly closing lead.
fn synth_inputs(n: usize) -> Vec<(VehicleState, ActuatorRequest)> {
    (0..n)
        .map(|i| {
            let t = i as f32 * 0.01;
            let s = VehicleState {
                v_ego: (25.0 - t).max(0.0),
                a_ego: (t * 0.5).sin() * 0.5,
                steering_counter: ((i / 2) % 4) as u8,
                lead: Some(Lead {
                    distance: (60.0 - t * 2.0).max(1.0),
                    velocity: 15.0,
                }),
                ..VehicleState::default()
            };
            let r = ActuatorRequest {
                accel: (t * 0.3).sin(),
                accel_pitch_compensated: (t * 0.3).sin() - 0.05,
                steer: (t * 0.9).sin() * 0.5,
            };
            (s, r)
        })
        .collect()
}

fn bench_cycle(c: &mut Criterion) {
    let inputs = synth_inputs(1_000);
    let hud = HudParams::default();

    c.bench_function("update_engaged_1000_cycles", |b| {
        b.iter_batched(
            controller,
            |mut ctl| {
                for (cycle, (s, r)) in inputs.iter().enumerate() {
                    let mut s = s.clone();
                    black_box(ctl.update(cycle as u64, true, &mut s, r, &hud));
                }
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("update_one_pedal_1000_cycles", |b| {
        b.iter_batched(
            controller,
            |mut ctl| {
                for (cycle, (s, r)) in inputs.iter().enumerate() {
                    let mut s = VehicleState {
                        gear: Gear::Low,
                        drive_mode: DriveMode::Low,
                        ..s.clone()
                    };
                    s.one_pedal.active = true;
                    black_box(ctl.update(cycle as u64, false, &mut s, r, &hud));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_cycle);
criterion_main!(benches);
