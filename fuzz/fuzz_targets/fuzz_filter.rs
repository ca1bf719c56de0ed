#![no_main]

use libfuzzer_sys::fuzz_target;
use upstatic_rank::{filter, CandidateStore};

const MAX_INPUT_SIZE: usize = 4 * 1024;
const MAX_QUERY: usize = 8;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_SIZE {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut lines = text.lines();
    let Some(query) = lines.next() else {
        return;
    };
    if query.chars().count() > MAX_QUERY {
        return;
    }

    let store = CandidateStore::build(lines);
    let results = filter(&store, query);

    let mut previous: Option<(f64, usize)> = None;
    for m in results.matches() {
        assert!(m.candidate_index < store.len());
        assert!(m.score > 0.0 && m.score <= 1.0);
        if let Some((score, index)) = previous {
            assert!(score > m.score || (score == m.score && index < m.candidate_index));
        }
        previous = Some((m.score, m.candidate_index));
    }
});
