//! Fuzz target for config parsing and custom type construction
//!
//! Arbitrary TOML must either fail to parse or produce a config whose
//! validation and registration never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(config) = toml::from_str::<filesig_core::ProbeConfig>(data) else {
        return;
    };
    let _ = config.validate();
    let _ = config.exclude_patterns();

    let registry = filesig_core::FileTypeRegistry::new();
    let _ = config.apply(&registry);
    assert!(registry.custom_types().len() <= config.custom_types.len());
});
