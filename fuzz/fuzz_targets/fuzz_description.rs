//! Fuzz target for patch description parsing.

#![no_main]

use ct_bundle::DescriptionContent;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(description) = DescriptionContent::from_json(json, Path::new("fuzz.json")) {
            assert!(!description.is_empty());
        }
    }
});
