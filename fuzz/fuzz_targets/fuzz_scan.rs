//! Fuzz target for PAM compilation and guide scanning
//!
//! The first line of the input is the PAM motif, the second the guide length
//! and the rest the sequence. Compilation may fail; scanning must never panic
//! and every reported guide must lie inside the sequence.

#![no_main]

use agro_grna::scan::{scan, PamPattern, ScanParams};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 10_000 {
        return;
    }

    let mut parts = input.splitn(3, '\n');
    let motif = parts.next().unwrap_or_default();
    let guide_length = parts
        .next()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(20);
    let sequence = parts.next().unwrap_or_default();

    let Ok(pam) = PamPattern::new(motif) else {
        return;
    };
    let Ok(params) = ScanParams::new(pam, guide_length, 5) else {
        return;
    };

    for guide in scan(sequence, &params) {
        assert!(guide.end_offset() <= sequence.len());
        assert_eq!(guide.sequence.len(), guide_length);
    }
});
