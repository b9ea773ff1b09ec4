#![no_main]

use libfuzzer_sys::fuzz_target;
use slidefence_core::EngineOptions;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    // Loading and validation must never panic; errors are fine.
    if let Ok(options) = EngineOptions::from_toml_str(text) {
        let _ = options.build();
    }
    if let Ok(options) = EngineOptions::from_json_str(text) {
        if let Ok(config) = options.build() {
            assert!(config.threshold().is_finite() && config.threshold() >= 0.0);
            assert!(config.max_iterations() >= 1);
            assert!(!config.check_interval().is_zero());
        }
    }
});
