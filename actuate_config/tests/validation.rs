use actuate_config::load_toml;
use rstest::rstest;

const BASE: &str = r#"
[steering]
max = 300
delta_up = 7
delta_down = 17

[longitudinal]
max_gas = 3072
zero_gas = 2048
max_acc_regen = 1404
max_brake = 350
gas_lookup = [[-1.0, 1404.0], [0.0, 2048.0], [2.0, 3072.0]]
brake_lookup = { bp = [-1.0, -0.1], v = [350.0, 0.0] }

[schedule]
steer = 2
longitudinal = 4
"#;

#[test]
fn accepts_minimal_config() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.longitudinal.gas_lookup.bp, vec![-1.0, 0.0, 2.0]);
    // Omitted sections fall back to defaults
    assert_eq!(cfg.schedule.camera_keepalive, 100);
    assert!((cfg.one_pedal.min_speed - 2.1).abs() < 1e-6);
}

#[test]
fn empty_document_uses_defaults() {
    let cfg = load_toml("").expect("parse empty TOML");
    cfg.validate().expect("defaults validate");
}

#[rstest]
#[case("brake_lookup = { bp = [-0.1, -1.0], v = [0.0, 350.0] }", "strictly increasing")]
#[case("gas_lookup = [[-1.0, 1404.0], [0.0, 3000.0], [2.0, 2048.0]]", "monotonic")]
#[case("brake_lookup = { bp = [-1.0, -0.1], v = [350.0] }", "length mismatch")]
#[case("max_acc_regen = 2100", "max_acc_regen <= zero_gas")]
#[case("gas_pressed_threshold = 0.0", "gas_pressed_threshold")]
fn rejects_bad_longitudinal(#[case] line: &str, #[case] needle: &str) {
    let toml = format!("[longitudinal]\n{line}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "unexpected message: {msg}");
}

#[rstest]
#[case("[schedule]\nlongitudinal = 0\n", "schedule periods")]
#[case("[steering]\ndelta_up = 0\n", "delta_up")]
#[case("[steering]\nfree_torque = 400\n", "free_torque")]
#[case("[one_pedal]\ndecel_ms2 = [-1.0, 0.5]\n", "decel_ms2")]
#[case("[one_pedal]\nrate_ramp_up = 0.0\n", "rate_ramp_up")]
#[case("[one_pedal.pid]\nspeed_mph = [10.0, 20.0]\nkp = [1.0]\n", "gain tables")]
#[case("[runner]\nrate_hz = 0\n", "rate_hz")]
fn rejects_bad_sections(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "unexpected message: {msg}");
}

#[test]
fn parses_scenario_names() {
    let cfg = load_toml("[runner]\nscenario = \"one-pedal\"\ncycles = 10\n").expect("parse");
    assert_eq!(cfg.runner.scenario, actuate_config::Scenario::OnePedal);
    assert_eq!(cfg.runner.cycles, 10);
}
