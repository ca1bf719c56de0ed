//! Abbreviation ranking for suggestion lists.
//!
//! The crate is split into three layers, leaves first:
//!
//! - [`score`]: the recursive substring-subsequence scorer (a port of the
//!   Quicksilver ranking algorithm). Pure and deterministic.
//! - [`CandidateStore`]: an immutable snapshot of lowercased candidate texts,
//!   indexed in their original display order.
//! - [`filter`]: runs the scorer over a store and returns an
//!   [`OrderedResultList`] sorted by descending score, ties broken by
//!   ascending candidate index.
//!
//! Matching works on raw lowercased Unicode scalar values; there is no locale
//! aware comparison.

#![forbid(unsafe_code)]

mod error;
mod query;
mod scoring;
mod store;

pub use error::{InputSource, RankError};
pub use query::{filter, OrderedResultList, ResultKind, ScoredMatch, UNFILTERED_SCORE};
pub use scoring::{score, score_chars, try_score, PASS_THROUGH_SCORE};
pub use store::{Candidate, CandidateStore};
