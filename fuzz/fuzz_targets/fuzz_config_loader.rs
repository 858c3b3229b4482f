#![no_main]
use libfuzzer_sys::fuzz_target;

// Parse and validation errors are fine; panics are not.
fuzz_target!(|data: &str| {
    if let Ok(cfg) = actuate_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let _ = actuate_core::Controller::builder()
                .with_config(&cfg)
                .and_then(|b| b.build());
        }
    }
});
