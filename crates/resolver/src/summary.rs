use std::collections::BTreeSet;

use crate::model::{BatchSummary, MatchMode, MatchResult};

/// Compute summary counts for a resolved batch.
pub fn summarize(
    results: &[MatchResult],
    references: usize,
    threshold: u8,
    mode: MatchMode,
) -> BatchSummary {
    let mut matched = 0;
    let mut claimed = BTreeSet::new();

    for r in results {
        if r.matched {
            matched += 1;
            if let Some(idx) = r.reference {
                claimed.insert(idx);
            }
        }
    }

    BatchSummary {
        candidates: results.len(),
        matched,
        unmatched: results.len() - matched,
        references,
        references_claimed: claimed.len(),
        threshold,
        mode,
    }
}
