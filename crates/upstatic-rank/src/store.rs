use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{InputSource, RankError};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// One entry of a [`CandidateStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    index: usize,
    text: String,
    normalized: Box<[char]>,
}

impl Candidate {
    fn new(index: usize, text: String) -> Self {
        let normalized = text.to_lowercase().chars().collect();
        Self {
            index,
            text,
            normalized,
        }
    }

    /// Position of the candidate in the original list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The display text as provided by the caller.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercased text the scorer runs against.
    pub fn normalized(&self) -> &[char] {
        &self.normalized
    }
}

/// Immutable snapshot of the candidate list.
///
/// Every store gets a process-unique revision; sessions compare revisions to
/// discard passes that were computed against a store that has since been
/// replaced.
#[derive(Debug)]
pub struct CandidateStore {
    candidates: Vec<Candidate>,
    revision: u64,
}

impl CandidateStore {
    pub fn build<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Candidate::new(index, text.into()))
            .collect();
        Self::from_candidates(candidates)
    }

    /// Build a store from raw byte entries, failing on the first entry that is
    /// not valid UTF-8.
    pub fn try_from_bytes<I, B>(entries: I) -> Result<Self, RankError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut candidates = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let text = std::str::from_utf8(entry.as_ref())
                .map_err(|err| RankError::invalid(InputSource::Candidate(index), err))?;
            candidates.push(Candidate::new(index, text.to_owned()));
        }
        Ok(Self::from_candidates(candidates))
    }

    fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let revision = NEXT_REVISION.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            target: "upstatic.rank",
            revision,
            candidates = candidates.len(),
            "built candidate store"
        );
        Self {
            candidates,
            revision,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }
}

impl<'a> IntoIterator for &'a CandidateStore {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
