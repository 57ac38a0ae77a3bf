//! Fuzz target for content probing
//!
//! Any byte sequence must resolve to some registered type without panicking,
//! including inputs shorter than the probe window or than the TAR offset.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

static REGISTRY: OnceLock<filesig_core::FileTypeRegistry> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let registry = REGISTRY.get_or_init(filesig_core::FileTypeRegistry::new);
    let found = registry.probe_bytes(data);

    assert!(registry.find(found.name()).is_some());
    if data.is_empty() {
        assert!(filesig_core::is_unknown(found.as_ref()));
    }
});
