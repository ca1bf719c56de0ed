use std::fmt;

use thiserror::Error;

/// Which argument of a ranking operation carried the bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Haystack,
    Abbreviation,
    /// Entry `n` of a candidate list.
    Candidate(usize),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Haystack => f.write_str("haystack"),
            InputSource::Abbreviation => f.write_str("abbreviation"),
            InputSource::Candidate(index) => write!(f, "candidate #{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    /// The input was not text (not valid UTF-8).
    #[error("{source_kind} is not valid UTF-8 text (valid up to byte {valid_up_to})")]
    InvalidInput {
        source_kind: InputSource,
        valid_up_to: usize,
    },
}

impl RankError {
    pub(crate) fn invalid(source_kind: InputSource, err: std::str::Utf8Error) -> Self {
        RankError::InvalidInput {
            source_kind,
            valid_up_to: err.valid_up_to(),
        }
    }
}
