use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One row of the canonical table. Only `title` is read by the resolver;
/// `fields` rides along for the caller (date, URL, flags).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRecord {
    /// Position in the source table (0-based, header excluded).
    pub index: usize,
    pub title: String,
    pub fields: BTreeMap<String, String>,
}

impl ReferenceRecord {
    pub fn new(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            fields: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// How a batch of candidates shares the reference set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Each candidate resolved on its own; several may land on one reference.
    #[serde(alias = "greedy-independent")]
    GreedyIndependent,
    /// One-to-one pairing maximizing total score.
    #[serde(alias = "optimal-assignment")]
    OptimalAssignment,
    /// One-to-one, highest-scoring pairs claimed first.
    #[serde(alias = "greedy-exclusive")]
    GreedyExclusive,
}

impl Default for MatchMode {
    fn default() -> Self {
        Self::GreedyIndependent
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreedyIndependent => write!(f, "greedy-independent"),
            Self::OptimalAssignment => write!(f, "optimal-assignment"),
            Self::GreedyExclusive => write!(f, "greedy-exclusive"),
        }
    }
}

impl MatchMode {
    /// Whether each reference may be claimed at most once.
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Self::GreedyIndependent)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Resolution of one candidate.
///
/// `matched` implies `reference.is_some()` and `score >= threshold`. An
/// unmatched result still carries the best score seen, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub reference: Option<usize>,
    pub score: u8,
    pub matched: bool,
}

impl MatchResult {
    pub fn accepted(reference: usize, score: u8) -> Self {
        Self {
            reference: Some(reference),
            score,
            matched: true,
        }
    }

    pub fn rejected(score: u8) -> Self {
        Self {
            reference: None,
            score,
            matched: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub candidates: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub references: usize,
    /// Distinct references claimed by at least one match.
    pub references_claimed: usize,
    pub threshold: u8,
    pub mode: MatchMode,
}
