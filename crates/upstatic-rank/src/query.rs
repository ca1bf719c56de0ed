use std::cmp::Ordering;
use std::time::Instant;

use crate::scoring::score_chars;
use crate::store::CandidateStore;

/// Score attached to every entry of an unfiltered (empty query) list.
pub const UNFILTERED_SCORE: f64 = 1.0;

/// One ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMatch {
    pub candidate_index: usize,
    pub score: f64,
}

/// How an [`OrderedResultList`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// The query was empty: every candidate, in original order, no scoring.
    Unfiltered,
    /// Candidates with a strictly positive score, best first.
    Ranked,
}

/// Result of one filter pass.
///
/// Sorted by descending score; equal scores are ordered by ascending candidate
/// index so the ordering is fully deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedResultList {
    query: String,
    kind: ResultKind,
    revision: u64,
    matches: Vec<ScoredMatch>,
}

impl OrderedResultList {
    /// The lowercased query this list was computed for.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Revision of the [`CandidateStore`] the pass ran against.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn matches(&self) -> &[ScoredMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Candidate indices in result order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.matches.iter().map(|m| m.candidate_index)
    }

    pub fn contains(&self, candidate_index: usize) -> bool {
        self.matches
            .iter()
            .any(|m| m.candidate_index == candidate_index)
    }
}

fn cmp_matches(a: &ScoredMatch, b: &ScoredMatch) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate_index.cmp(&b.candidate_index))
}

/// Rank every candidate of `store` against `query`.
///
/// The query is lowercased first. An empty query takes a separate path that
/// returns all candidates in their original order without running the scorer.
pub fn filter(store: &CandidateStore, query: &str) -> OrderedResultList {
    let query = query.to_lowercase();

    if query.is_empty() {
        let matches = store
            .iter()
            .map(|candidate| ScoredMatch {
                candidate_index: candidate.index(),
                score: UNFILTERED_SCORE,
            })
            .collect();
        return OrderedResultList {
            query,
            kind: ResultKind::Unfiltered,
            revision: store.revision(),
            matches,
        };
    }

    let started = Instant::now();
    let abbreviation: Vec<char> = query.chars().collect();

    let mut matches: Vec<ScoredMatch> = store
        .iter()
        .filter_map(|candidate| {
            let score = score_chars(candidate.normalized(), &abbreviation);
            (score > 0.0).then_some(ScoredMatch {
                candidate_index: candidate.index(),
                score,
            })
        })
        .collect();
    matches.sort_by(cmp_matches);

    tracing::debug!(
        target: "upstatic.rank",
        query = %query,
        revision = store.revision(),
        candidates = store.len(),
        matches = matches.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "filter pass"
    );

    OrderedResultList {
        query,
        kind: ResultKind::Ranked,
        revision: store.revision(),
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_returns_everything_in_order() {
        let store = CandidateStore::build(["b", "a", "c"]);
        let results = filter(&store, "");
        assert_eq!(results.kind(), ResultKind::Unfiltered);
        assert_eq!(results.indices().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(results
            .matches()
            .iter()
            .all(|m| m.score == UNFILTERED_SCORE));
        assert_eq!(results.revision(), store.revision());
    }

    #[test]
    fn query_is_lowercased() {
        let store = CandidateStore::build(["Cache"]);
        let results = filter(&store, "CACHE");
        assert_eq!(results.query(), "cache");
        assert_eq!(results.matches(), &[ScoredMatch { candidate_index: 0, score: 1.0 }]);
    }

    #[test]
    fn zero_scores_are_dropped() {
        let store = CandidateStore::build(["alpha", "beta"]);
        let results = filter(&store, "zeta");
        assert_eq!(results.kind(), ResultKind::Ranked);
        assert!(results.is_empty());
    }

    #[test]
    fn ties_keep_candidate_order() {
        // Identical texts score identically.
        let store = CandidateStore::build(["other", "cache", "xyz", "cache", "Cache"]);
        let results = filter(&store, "cache");
        assert_eq!(results.indices().collect::<Vec<_>>(), vec![1, 3, 4]);
    }

    #[test]
    fn better_matches_come_first() {
        let store = CandidateStore::build(["foobar", "bar", "foo bar"]);
        let results = filter(&store, "bar");
        assert_eq!(results.indices().collect::<Vec<_>>(), vec![1, 2, 0]);
        assert!(results.contains(0));
    }
}
