//! Fuzz target for archive expansion.
//!
//! Arbitrary bytes must produce an error or a tree confined to the destination.

#![no_main]

use ct_bundle::extract::expand_reader;
use ct_bundle::ExtractLimits;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::TempDir::new() else {
        return;
    };
    let limits = ExtractLimits {
        max_entries: 64,
        max_uncompressed_bytes: 1 << 20,
    };
    let _ = expand_reader(Cursor::new(data), Path::new("fuzz.zip"), dir.path(), &limits);
});
