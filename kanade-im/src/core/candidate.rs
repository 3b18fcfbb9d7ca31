//! Candidate list as reported by the engine

use serde::{Deserialize, Serialize};

/// Stable identifier the engine assigns to each candidate
pub type CandidateId = u32;

/// A single conversion candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier used to select this candidate
    pub id: CandidateId,
    /// The converted text
    pub value: String,
    /// Optional annotation (e.g., word type, dictionary info)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl Candidate {
    pub fn new(id: CandidateId, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
            annotation: None,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }
}

/// Ordered candidates plus the preedit position they belong to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateList {
    #[serde(default)]
    candidates: Vec<Candidate>,
    /// Character offset in the preedit the window is anchored to
    #[serde(default)]
    position: usize,
    /// Index of the focused candidate, if the engine reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    focused: Option<usize>,
}

impl CandidateList {
    /// Create a new candidate list anchored at `position`
    pub fn new(candidates: Vec<Candidate>, position: usize) -> Self {
        Self {
            candidates,
            position,
            focused: None,
        }
    }

    /// Create a candidate list from strings, ids assigned in order from 0
    pub fn from_values(values: impl IntoIterator<Item = impl Into<String>>, position: usize) -> Self {
        let candidates = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Candidate::new(i as CandidateId, v))
            .collect();
        Self::new(candidates, position)
    }

    pub fn with_focused(mut self, index: usize) -> Self {
        self.focused = (index < self.candidates.len()).then_some(index);
        self
    }

    /// Get all candidates
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Look up a candidate by id
    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.get(id).is_some()
    }
}
