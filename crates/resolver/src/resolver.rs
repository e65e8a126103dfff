use rayon::prelude::*;

use crate::assignment::{self, INFEASIBLE_COST};
use crate::config::ResolverConfig;
use crate::error::{check_threshold, ResolveError};
use crate::model::{MatchMode, MatchResult};
use crate::normalize::Normalizer;
use crate::similarity::{self, Scorer};

/// Stateless matcher: a normalizer and a scorer. Holds no per-call state,
/// so one instance can be shared across threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolver {
    pub normalizer: Normalizer,
    pub scorer: Scorer,
}

/// Scores of one candidate against every reference. `None` when the
/// candidate normalizes to nothing and can never match.
type ScoreRow = Option<Vec<u8>>;

impl Resolver {
    pub fn new(normalizer: Normalizer, scorer: Scorer) -> Self {
        Self { normalizer, scorer }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.normalizer(), config.scorer)
    }

    /// Normalize both sides and score them.
    pub fn score_pair(&self, a: &str, b: &str) -> u8 {
        self.scorer
            .score(&self.normalizer.normalize(a), &self.normalizer.normalize(b))
    }

    /// Best reference for one candidate. Equal scores are ranked by the plain
    /// ratio of the normalized strings, then by the lowest index.
    pub fn resolve_one<S: AsRef<str>>(
        &self,
        candidate: &str,
        references: &[S],
        threshold: u8,
    ) -> Result<MatchResult, ResolveError> {
        check_threshold(threshold)?;
        let refs = self.normalize_all(references);
        let result = self.best_of(&self.normalizer.normalize(candidate), &refs, threshold);
        log::debug!("resolved {candidate:?}: {result:?}");
        Ok(result)
    }

    /// Resolve every candidate; output order follows `candidates`.
    pub fn resolve_batch<S, T>(
        &self,
        candidates: &[S],
        references: &[T],
        threshold: u8,
        mode: MatchMode,
    ) -> Result<Vec<MatchResult>, ResolveError>
    where
        S: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        check_threshold(threshold)?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        if references.is_empty() {
            return Ok(vec![MatchResult::rejected(0); candidates.len()]);
        }

        let results = match mode {
            MatchMode::GreedyIndependent => {
                let refs = self.normalize_all(references);
                candidates
                    .par_iter()
                    .map(|c| self.best_of(&self.normalizer.normalize(c.as_ref()), &refs, threshold))
                    .collect()
            }
            MatchMode::OptimalAssignment => {
                assign_optimal(&self.score_rows(candidates, references), references.len(), threshold)
            }
            MatchMode::GreedyExclusive => {
                assign_greedy_exclusive(&self.score_rows(candidates, references), threshold)
            }
        };

        if log::log_enabled!(log::Level::Debug) {
            for (c, r) in candidates.iter().zip(&results) {
                log::debug!("resolved {:?} ({mode}): {r:?}", c.as_ref());
            }
        }
        Ok(results)
    }

    /// Full candidate x reference score matrix after normalization.
    /// A candidate that normalizes to nothing gets a row of zeros.
    pub fn score_matrix<S, T>(&self, candidates: &[S], references: &[T]) -> Vec<Vec<u8>>
    where
        S: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        self.score_rows(candidates, references)
            .into_iter()
            .map(|row| row.unwrap_or_else(|| vec![0; references.len()]))
            .collect()
    }

    fn score_rows<S, T>(&self, candidates: &[S], references: &[T]) -> Vec<ScoreRow>
    where
        S: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        let refs = self.normalize_all(references);
        candidates
            .par_iter()
            .map(|c| {
                let c = self.normalizer.normalize(c.as_ref());
                if c.is_empty() {
                    return None;
                }
                Some(refs.iter().map(|r| self.scorer.score(&c, r)).collect())
            })
            .collect()
    }

    fn normalize_all<T: AsRef<str>>(&self, items: &[T]) -> Vec<String> {
        items
            .iter()
            .map(|s| self.normalizer.normalize(s.as_ref()))
            .collect()
    }

    fn best_of(&self, candidate: &str, references: &[String], threshold: u8) -> MatchResult {
        if candidate.is_empty() {
            return MatchResult::rejected(0);
        }

        let mut best: Option<(usize, u8, f64)> = None;
        for (i, reference) in references.iter().enumerate() {
            let score = self.scorer.score(candidate, reference);
            let closeness = similarity::ratio(candidate, reference);
            log::trace!("{candidate:?} vs [{i}] {reference:?}: {score} ({closeness:.1})");
            // Strictly greater: the first of fully equal keys wins.
            let closer = best.map_or(true, |(_, top, top_closeness)| {
                score > top || (score == top && closeness > top_closeness)
            });
            if closer {
                best = Some((i, score, closeness));
                if closeness >= 100.0 {
                    break;
                }
            }
        }

        match best {
            Some((i, score, _)) if score >= threshold => MatchResult::accepted(i, score),
            Some((_, score, _)) => MatchResult::rejected(score),
            None => MatchResult::rejected(0),
        }
    }
}

fn row_best(row: &ScoreRow) -> u8 {
    row.as_ref()
        .and_then(|scores| scores.iter().copied().max())
        .unwrap_or(0)
}

/// One-to-one pairing minimizing `100 - score`; pairs under the threshold
/// cost `INFEASIBLE_COST` and are discarded if the solver is forced to use them.
fn assign_optimal(rows: &[ScoreRow], width: usize, threshold: u8) -> Vec<MatchResult> {
    let cost: Vec<Vec<i64>> = rows
        .iter()
        .map(|row| match row {
            Some(scores) => scores
                .iter()
                .map(|&s| {
                    if s >= threshold {
                        100 - i64::from(s)
                    } else {
                        INFEASIBLE_COST
                    }
                })
                .collect(),
            None => vec![INFEASIBLE_COST; width],
        })
        .collect();

    let picks = assignment::solve(&cost);

    rows.iter()
        .zip(picks)
        .map(|(row, pick)| match (row, pick) {
            (Some(scores), Some(col)) if scores[col] >= threshold => {
                MatchResult::accepted(col, scores[col])
            }
            _ => MatchResult::rejected(row_best(row)),
        })
        .collect()
}

/// One-to-one pairing claiming the highest scores first
/// (ties: lower candidate, then lower reference).
fn assign_greedy_exclusive(rows: &[ScoreRow], threshold: u8) -> Vec<MatchResult> {
    let mut pairs: Vec<(u8, usize, usize)> = Vec::new();
    let mut width = 0;
    for (ci, row) in rows.iter().enumerate() {
        let Some(scores) = row else { continue };
        width = width.max(scores.len());
        for (ri, &s) in scores.iter().enumerate() {
            if s >= threshold {
                pairs.push((s, ci, ri));
            }
        }
    }
    pairs.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut results: Vec<MatchResult> = rows
        .iter()
        .map(|row| MatchResult::rejected(row_best(row)))
        .collect();
    let mut candidate_used = vec![false; rows.len()];
    let mut reference_used = vec![false; width];

    for (score, ci, ri) in pairs {
        if candidate_used[ci] || reference_used[ri] {
            continue;
        }
        candidate_used[ci] = true;
        reference_used[ri] = true;
        results[ci] = MatchResult::accepted(ri, score);
    }
    results
}

// ---------------------------------------------------------------------------
// Default-resolver shorthands
// ---------------------------------------------------------------------------

pub fn resolve_one<S: AsRef<str>>(
    candidate: &str,
    references: &[S],
    threshold: u8,
) -> Result<MatchResult, ResolveError> {
    Resolver::default().resolve_one(candidate, references, threshold)
}

pub fn resolve_batch<S, T>(
    candidates: &[S],
    references: &[T],
    threshold: u8,
    mode: MatchMode,
) -> Result<Vec<MatchResult>, ResolveError>
where
    S: AsRef<str> + Sync,
    T: AsRef<str> + Sync,
{
    Resolver::default().resolve_batch(candidates, references, threshold, mode)
}
