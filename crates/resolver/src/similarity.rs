use std::collections::BTreeSet;

use rapidfuzz::distance::indel;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scorer selection
// ---------------------------------------------------------------------------

/// Similarity measure used to compare two normalized strings.
///
/// The ratio family is built on the Indel similarity (insertions and
/// deletions only, i.e. longest common subsequence):
/// `200 * lcs / (len_a + len_b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    /// Whole-string Indel similarity.
    Ratio,
    /// Best alignment of the shorter string inside the longer one.
    PartialRatio,
    /// Ratio after sorting word tokens.
    TokenSort,
    /// Intersection / difference comparison of the word token sets.
    TokenSet,
    /// 100 on any shared token, otherwise partial ratio of the differences.
    /// Shared stopwords alone score 100, so keep it for short, distinctive titles.
    PartialTokenSet,
    /// Higher of `TokenSet` and the Jaro-Winkler similarity of the whole
    /// strings. Word order and extra tokens are forgiven through the token
    /// set; inflected words (`revealed` / `revealing`) through Jaro-Winkler.
    TokenSetWinkler,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::TokenSetWinkler
    }
}

impl std::fmt::Display for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ratio => write!(f, "ratio"),
            Self::PartialRatio => write!(f, "partial_ratio"),
            Self::TokenSort => write!(f, "token_sort"),
            Self::TokenSet => write!(f, "token_set"),
            Self::PartialTokenSet => write!(f, "partial_token_set"),
            Self::TokenSetWinkler => write!(f, "token_set_winkler"),
        }
    }
}

impl Scorer {
    /// Score two already-normalized strings, 0..=100.
    ///
    /// Identical inputs score 100, empty included. A non-empty string
    /// against an empty one scores 0. Symmetric for every variant.
    pub fn score(self, a: &str, b: &str) -> u8 {
        if a == b {
            return 100;
        }
        let raw = match self {
            Self::Ratio => ratio(a, b),
            Self::PartialRatio => partial_ratio(a, b),
            Self::TokenSort => token_sort_ratio(a, b),
            Self::TokenSet => token_set_ratio(a, b),
            Self::PartialTokenSet => partial_token_set_ratio(a, b),
            Self::TokenSetWinkler => token_set_ratio(a, b).max(jaro_winkler(a, b)),
        };
        raw.round().clamp(0.0, 100.0) as u8
    }
}

/// Score with the default scorer.
pub fn score(a: &str, b: &str) -> u8 {
    Scorer::default().score(a, b)
}

// ---------------------------------------------------------------------------
// Character-level measures
// ---------------------------------------------------------------------------

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    100.0 * indel::normalized_similarity(a.iter().copied(), b.iter().copied())
}

/// Whole-string Indel ratio, 0.0..=100.0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_ratio(&a, &b)
}

pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    let best = best_window(short, long);
    if short.len() == long.len() {
        // Either side may act as the needle; take both so the score is symmetric.
        return best.max(best_window(long, short));
    }
    best
}

/// Best Indel ratio of `needle` against every window of `hay` with the
/// needle's length, including the shorter windows at both edges.
///
/// The needle is preprocessed once; each window is then a bit-parallel
/// LCS pass rather than a full dynamic-programming table.
fn best_window(needle: &[char], hay: &[char]) -> f64 {
    let n = needle.len();
    let m = hay.len();
    let scorer = indel::BatchComparator::new(needle.iter().copied());
    let window = |w: &[char]| 100.0 * scorer.normalized_similarity(w.iter().copied());
    let mut best = 0.0f64;

    for end in 1..n.min(m + 1) {
        best = best.max(window(&hay[..end]));
    }
    for start in 0..=(m - n) {
        best = best.max(window(&hay[start..start + n]));
        if best >= 100.0 {
            return 100.0;
        }
    }
    for start in (m - n + 1)..m {
        best = best.max(window(&hay[start..]));
    }
    best
}

/// Jaro-Winkler similarity scaled to 0.0..=100.0. The prefix boost only
/// applies above a Jaro score of 0.7; both directions are taken so the
/// score never depends on argument order.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    100.0 * strsim::jaro_winkler(a, b).max(strsim::jaro_winkler(b, a))
}

// ---------------------------------------------------------------------------
// Token-level measures
// ---------------------------------------------------------------------------

fn token_set(s: &str) -> BTreeSet<&str> {
    s.split_whitespace().collect()
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted = |s: &str| {
        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        tokens.sort_unstable();
        tokens.join(" ")
    };
    ratio(&sorted(a), &sorted(b))
}

struct TokenSplit<'a> {
    shared: Vec<&'a str>,
    only_a: Vec<&'a str>,
    only_b: Vec<&'a str>,
}

fn split_tokens<'a>(a: &'a str, b: &'a str) -> Option<TokenSplit<'a>> {
    let ta = token_set(a);
    let tb = token_set(b);
    if ta.is_empty() || tb.is_empty() {
        return None;
    }
    Some(TokenSplit {
        shared: ta.intersection(&tb).copied().collect(),
        only_a: ta.difference(&tb).copied().collect(),
        only_b: tb.difference(&ta).copied().collect(),
    })
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let Some(split) = split_tokens(a, b) else {
        return 0.0;
    };
    // One token set contains the other.
    if !split.shared.is_empty() && (split.only_a.is_empty() || split.only_b.is_empty()) {
        return 100.0;
    }

    let sect = split.shared.join(" ");
    let with_sect = |rest: &[&str]| {
        if sect.is_empty() {
            rest.join(" ")
        } else {
            format!("{sect} {}", rest.join(" "))
        }
    };
    let sect_a = with_sect(&split.only_a);
    let sect_b = with_sect(&split.only_b);

    let mut best = ratio(&sect_a, &sect_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &sect_a)).max(ratio(&sect, &sect_b));
    }
    best
}

pub fn partial_token_set_ratio(a: &str, b: &str) -> f64 {
    let Some(split) = split_tokens(a, b) else {
        return 0.0;
    };
    if !split.shared.is_empty() {
        return 100.0;
    }
    partial_ratio(&split.only_a.join(" "), &split.only_b.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Scorer; 6] = [
        Scorer::Ratio,
        Scorer::PartialRatio,
        Scorer::TokenSort,
        Scorer::TokenSet,
        Scorer::PartialTokenSet,
        Scorer::TokenSetWinkler,
    ];

    #[test]
    fn identical_is_100() {
        for s in ALL {
            assert_eq!(s.score("revealing choice bracketing", "revealing choice bracketing"), 100);
            assert_eq!(s.score("", ""), 100);
        }
    }

    #[test]
    fn empty_side_is_zero() {
        for s in ALL {
            assert_eq!(s.score("abc", ""), 0, "{s}");
            assert_eq!(s.score("", "abc"), 0, "{s}");
        }
    }

    #[test]
    fn plain_ratio() {
        assert_eq!(Scorer::Ratio.score("abcd", "abce"), 75);
        assert_eq!(Scorer::Ratio.score("ab", "cd"), 0);
    }

    #[test]
    fn indel_ratio_counts_common_subsequence() {
        // lcs("abcde", "ace") = 3 -> 200 * 3 / 8
        assert_eq!(ratio("abcde", "ace"), 75.0);
        assert_eq!(ratio("ace", "abcde"), 75.0);
        assert_eq!(ratio("", "abc"), 0.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn partial_finds_substring() {
        assert_eq!(Scorer::PartialRatio.score("title a", "paper title a revised"), 100);
        assert_eq!(Scorer::PartialRatio.score("paper title a revised", "title a"), 100);
    }

    #[test]
    fn partial_uses_edge_windows() {
        // "xab" has no full-length window equal to "abz"; the edge window "ab" helps.
        let edge = partial_ratio("abz", "xab");
        assert!(edge >= 66.0, "{edge}");
    }

    #[test]
    fn token_sort_ignores_order() {
        assert_eq!(Scorer::TokenSort.score("bracketing choice", "choice bracketing"), 100);
    }

    #[test]
    fn token_set_subset_is_100() {
        assert_eq!(Scorer::TokenSet.score("paper title a revised", "paper title a"), 100);
        assert_eq!(Scorer::TokenSet.score("title paper", "paper title a"), 100);
    }

    #[test]
    fn token_set_disjoint_is_low() {
        assert!(Scorer::TokenSet.score("alpha beta", "gamma delta") < 60);
    }

    #[test]
    fn token_set_is_stricter_than_partial_token_set() {
        let a = "revealed preference bracketing";
        let b = "revealing choice bracketing";
        assert!(Scorer::TokenSet.score(a, b) < 85);
        assert_eq!(Scorer::PartialTokenSet.score(a, b), 100);
    }

    #[test]
    fn default_scorer_forgives_inflection() {
        let s = score("revealed preference bracketing", "revealing choice bracketing");
        assert!(s >= 85, "{s}");
        assert_eq!(Scorer::default(), Scorer::TokenSetWinkler);
    }

    #[test]
    fn default_scorer_ignores_shared_stopwords() {
        let pairs = [
            ("minimum wages and employment", "trade and growth"),
            ("the economics of growth", "a theory of reference points"),
            ("models of trade", "essays on trade"),
        ];
        for (a, b) in pairs {
            assert_eq!(Scorer::PartialTokenSet.score(a, b), 100, "{a:?} / {b:?}");
            let s = score(a, b);
            assert!(s < 75, "{a:?} / {b:?}: {s}");
        }
    }

    #[test]
    fn default_scorer_keeps_token_set_subsets() {
        assert_eq!(score("paper title a", "paper title a revised"), 100);
        assert_eq!(score("trade essays", "essays trade"), 100);
    }

    #[test]
    fn jaro_winkler_is_scaled() {
        assert_eq!(jaro_winkler("abc", "abc"), 100.0);
        assert_eq!(jaro_winkler("abc", ""), 0.0);
        assert_eq!(jaro_winkler("abc", "xyz"), 0.0);
    }

    #[test]
    fn partial_ratio_on_long_titles_is_exact() {
        let title = "the long run effects of minimum wages on employment and hours worked";
        let file = "aer minimum wages on employment and hours worked replication files";
        assert_eq!(partial_ratio(title, title), 100.0);
        let s = Scorer::PartialRatio.score(title, file);
        assert!(s > 60 && s < 100, "{s}");
    }

    #[test]
    fn partial_token_set_unrelated_is_low() {
        let s = Scorer::PartialTokenSet.score("random unrelated text", "revealing choice bracketing");
        assert!(s < 70, "{s}");
    }

    #[test]
    fn scorers_are_symmetric() {
        let pairs = [
            ("revealed preference bracketing", "revealing choice bracketing"),
            ("abz", "xab"),
            ("a theory of reference points", "reference dependent preferences"),
            ("short", "a much longer string with short inside"),
        ];
        for s in ALL {
            for (a, b) in pairs {
                assert_eq!(s.score(a, b), s.score(b, a), "{s}: {a:?} / {b:?}");
            }
        }
    }

    #[test]
    fn scorer_serde_names() {
        let s: Scorer = serde_json::from_str("\"token_set\"").unwrap();
        assert_eq!(s, Scorer::TokenSet);
        assert_eq!(serde_json::to_string(&Scorer::PartialTokenSet).unwrap(), "\"partial_token_set\"");
        assert_eq!(Scorer::PartialRatio.to_string(), "partial_ratio");
        assert_eq!(Scorer::default().to_string(), "token_set_winkler");
    }
}
