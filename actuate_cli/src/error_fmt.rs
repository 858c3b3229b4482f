//! Human-readable error descriptions and structured JSON error formatting.

use actuate_core::error::{BuildError, ControllerError};
use actuate_core::CurveError;

/// Exit code for a shutdown requested with Ctrl-C (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    let msg = err.to_string();
    if msg.contains("must have headers") {
        return "Invalid headers in lookup CSV. Expected 'accel,command'.".to_string();
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingParams => {
                "What happened: The controller was built without parameters.\nLikely causes: The config was not loaded before the controller was assembled.\nHow to fix: Pass --config or rely on the built-in defaults.".to_string()
            }
            BuildError::Curve { name, source } => {
                let hint = match source {
                    CurveError::Empty => "add at least one breakpoint",
                    CurveError::LengthMismatch { .. } => "give every breakpoint exactly one value",
                    CurveError::Unsorted => "sort breakpoints in strictly increasing order",
                    CurveError::NonMonotonic => "make the values consistently rising or falling",
                    CurveError::NonFinite => "remove NaN or infinite entries",
                };
                format!(
                    "What happened: Lookup table `{name}` is unusable ({source}).\nLikely causes: A hand-edited table in the TOML or lookup CSV.\nHow to fix: Fix the table and {hint}."
                )
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file and run `actuate check-config`."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControllerError>() {
        return match ce {
            ControllerError::Transport(msg) => format!(
                "What happened: Frames could not be delivered ({msg}).\nLikely causes: The bus went off or the transport was closed.\nHow to fix: Check the bus connection and restart the run."
            ),
            ControllerError::Input(msg) => format!(
                "What happened: The input source failed ({msg}).\nLikely causes: The vehicle state feed stopped or the simulated plant diverged.\nHow to fix: Re-run with --log-level=debug to see the last good cycle."
            ),
            ControllerError::Tuning(msg) => format!(
                "What happened: The tuning source failed ({msg}).\nLikely causes: The tuning file is missing or unreadable.\nHow to fix: Check the path given to --tuning."
            ),
            ControllerError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or lookup CSV.\nHow to fix: Edit the file and run `actuate check-config`."
            ),
            ControllerError::Interrupted { cycles } => format!(
                "Interrupted after {cycles} cycles.\nThe actuators were left at the last commanded frame."
            ),
        };
    }

    let cause = err
        .source()
        .map(|src| format!(" Cause: {src}"))
        .unwrap_or_default();
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 config, 4 transport, 5 input, 6 tuning, 130 interrupted, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<ControllerError>() {
        Some(ControllerError::Config(_)) => 3,
        Some(ControllerError::Transport(_)) => 4,
        Some(ControllerError::Input(_)) => 5,
        Some(ControllerError::Tuning(_)) => 6,
        Some(ControllerError::Interrupted { .. }) => EXIT_INTERRUPTED,
        None => 1,
    }
}

/// Stable name of the error kind for JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<ControllerError>() {
        Some(ControllerError::Config(_)) => "Config",
        Some(ControllerError::Transport(_)) => "Transport",
        Some(ControllerError::Input(_)) => "Input",
        Some(ControllerError::Tuning(_)) => "Tuning",
        Some(ControllerError::Interrupted { .. }) => "Interrupted",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(ControllerError::Interrupted { cycles }) = err.downcast_ref::<ControllerError>() {
        obj["details"] = json!({ "cycles": cycles });
    }
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ControllerError::Config("x".into()), 3, "Config")]
    #[case(ControllerError::Transport("bus off".into()), 4, "Transport")]
    #[case(ControllerError::Input("gone".into()), 5, "Input")]
    #[case(ControllerError::Tuning("gone".into()), 6, "Tuning")]
    #[case(ControllerError::Interrupted { cycles: 7 }, 130, "Interrupted")]
    fn controller_errors_map_to_stable_codes(
        #[case] e: ControllerError,
        #[case] code: i32,
        #[case] reason: &str,
    ) {
        let r = eyre::Report::new(e);
        assert_eq!(exit_code_for_error(&r), code);
        assert_eq!(reason_name(&r), reason);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&r)).expect("json");
        assert_eq!(v["reason"], reason);
        assert_eq!(v["exit_code"], code);
    }

    #[test]
    fn build_errors_are_config_errors() {
        let r = eyre::Report::new(BuildError::MissingParams);
        assert_eq!(exit_code_for_error(&r), 3);
        assert!(humanize(&r).contains("without parameters"));
    }

    #[test]
    fn untyped_errors_fall_back_to_generic_text() {
        let r = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&r), 1);
        assert!(humanize(&r).contains("Original: boom"));
    }
}
