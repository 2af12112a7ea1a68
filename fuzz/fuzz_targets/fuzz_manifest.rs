//! Fuzz target for manifest parsing.
//!
//! Manifests come from a remote service; parsing must reject, never panic.

#![no_main]

use ct_bundle::Manifest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(manifest) = Manifest::from_json(json) {
            // Anything accepted has a usable version
            assert!(manifest.version.is_finite() && manifest.version > 0.0);
        }
    }
});
