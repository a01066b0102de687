// ============================================================
// Layer 3 — Search Space Index
// ============================================================
// For every phrase, the search space enumerates the candidate
// groundings that are plausible for it. Each entry pairs a
// candidate with a row of the correspondence table, which is
// the set of labels the model normalises over for it.
//
// Ownership:
//   CandidatePool — owns every candidate grounding
//   SearchSpace   — entries hold `CandidateId`s into the pool,
//                   never their own copies
//
// Lookup rule: a phrase with its own entry list uses it;
// every other phrase uses the shared list. A search space
// filled from a world has only the shared list.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::cv::Cv;
use crate::domain::grounding::Grounding;
use crate::domain::phrase::PhraseId;

/// Index of a candidate in its `CandidatePool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    groundings: Vec<Grounding>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, grounding: Grounding) -> CandidateId {
        self.groundings.push(grounding);
        CandidateId(self.groundings.len() - 1)
    }

    pub fn get(&self, id: CandidateId) -> Option<&Grounding> {
        self.groundings.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.groundings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groundings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpaceEntry {
    pub cv_index:  usize,
    pub candidate: CandidateId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSpace {
    pub pool:   CandidatePool,
    shared:     Vec<SearchSpaceEntry>,
    per_phrase: HashMap<PhraseId, Vec<SearchSpaceEntry>>,
}

impl SearchSpace {
    pub fn new(pool: CandidatePool) -> Self {
        Self { pool, ..Self::default() }
    }

    /// Add an entry used by every phrase without its own list
    pub fn push_shared(&mut self, entry: SearchSpaceEntry) {
        self.shared.push(entry);
    }

    /// Add an entry to one phrase's own list
    pub fn push_for(&mut self, phrase: PhraseId, entry: SearchSpaceEntry) {
        self.per_phrase.entry(phrase).or_default().push(entry);
    }

    pub fn entries_for(&self, phrase: PhraseId) -> &[SearchSpaceEntry] {
        self.per_phrase
            .get(&phrase)
            .map(Vec::as_slice)
            .unwrap_or(&self.shared)
    }
}

/// Rows of candidate label sets, addressed by `SearchSpaceEntry::cv_index`
#[derive(Debug, Clone, PartialEq)]
pub struct CorrespondenceTable {
    rows: Vec<Vec<Cv>>,
}

impl CorrespondenceTable {
    pub fn new(rows: Vec<Vec<Cv>>) -> Self {
        Self { rows }
    }

    pub fn row(&self, cv_index: usize) -> Option<&[Cv]> {
        self.rows.get(cv_index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for CorrespondenceTable {
    /// One binary row: {False, True}
    fn default() -> Self {
        Self::new(vec![Cv::BINARY.to_vec()])
    }
}
