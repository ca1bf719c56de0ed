#![no_main]

use libfuzzer_sys::fuzz_target;
use upstatic_rank::try_score;

// The scorer backtracks over every run length; keep inputs small enough that a
// single iteration stays fast.
const MAX_HAYSTACK: usize = 96;
const MAX_ABBREVIATION: usize = 12;

fuzz_target!(|data: &[u8]| {
    let (haystack, abbreviation) = match data.iter().position(|b| *b == 0) {
        Some(split) => (&data[..split], &data[split + 1..]),
        None => (data, &[][..]),
    };
    if haystack.len() > MAX_HAYSTACK || abbreviation.len() > MAX_ABBREVIATION {
        return;
    }

    // Goal: never panic; valid text always scores inside the unit interval.
    if let Ok(value) = try_score(haystack, abbreviation) {
        assert!((0.0..=1.0).contains(&value), "score out of range: {value}");
        if abbreviation.is_empty() {
            assert_eq!(value, upstatic_rank::PASS_THROUGH_SCORE);
        }
    }
});
