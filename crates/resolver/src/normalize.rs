//! Text normalization applied to both candidates and reference titles
//! before scoring.
//!
//! File names carry naming-convention artifacts that say nothing about the
//! title: an extension, a `README_` marker, a journal code with an issue
//! number (`AER_123_`). Those are stripped here so they never dilute a score.

use serde::{Deserialize, Serialize};

pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "txt", "zip", "doc", "docx", "md"];
pub const DEFAULT_JOURNAL_CODES: &[&str] = &["aer", "ecma", "jpe", "qje", "restud"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalizer {
    /// Trailing file extensions to strip (without the dot).
    pub extensions: Vec<String>,
    /// Leading journal-code tokens to strip, optionally followed by a number.
    pub journal_codes: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            journal_codes: DEFAULT_JOURNAL_CODES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Normalizer {
    pub fn new(extensions: Vec<String>, journal_codes: Vec<String>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            journal_codes: journal_codes.into_iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Lower-case, strip extensions, turn `_`/`-` into spaces, drop
    /// punctuation, collapse whitespace, then strip boilerplate tokens.
    ///
    /// Idempotent: the output contains no dots, separators or punctuation,
    /// and boilerplate is stripped to a fixpoint, so a second pass is a no-op.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let stem = self.strip_extensions(lowered.trim_end());

        let mut cleaned = String::with_capacity(stem.len());
        for c in stem.chars() {
            if c == '_' || c == '-' {
                cleaned.push(' ');
            } else if c.is_alphanumeric() || c.is_whitespace() {
                cleaned.push(c);
            }
        }

        let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
        self.strip_boilerplate(&mut tokens);
        tokens.join(" ")
    }

    fn strip_extensions<'a>(&self, mut text: &'a str) -> &'a str {
        loop {
            let before = text.len();
            for ext in &self.extensions {
                if ext.is_empty() {
                    continue;
                }
                let dot = text.len().checked_sub(ext.len() + 1);
                if let Some(dot) = dot.filter(|&d| text.is_char_boundary(d)) {
                    let tail = &text[dot..];
                    if tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(ext) {
                        text = &text[..dot];
                    }
                }
            }
            if text.len() == before {
                return text;
            }
        }
    }

    fn strip_boilerplate(&self, tokens: &mut Vec<&str>) {
        loop {
            let before = tokens.len();

            let lead = readme_marker_len(tokens.iter().copied(), false);
            tokens.drain(..lead);

            let trail = readme_marker_len(tokens.iter().rev().copied(), true);
            tokens.truncate(tokens.len() - trail);

            if let Some(first) = tokens.first() {
                if self.journal_codes.iter().any(|c| c.eq_ignore_ascii_case(first)) {
                    let numbered = tokens
                        .get(1)
                        .is_some_and(|t| t.chars().all(|c| c.is_ascii_digit()));
                    tokens.drain(..if numbered { 2 } else { 1 });
                }
            }

            if tokens.len() == before {
                return;
            }
        }
    }
}

/// Number of tokens taken by a `readme` / `read me` marker at the start of
/// `tokens`. With `reversed` the iterator runs from the back, so the
/// two-token marker arrives as `me`, `read`.
fn readme_marker_len<'a>(mut tokens: impl Iterator<Item = &'a str>, reversed: bool) -> usize {
    let first = tokens.next();
    if first == Some("readme") {
        return 1;
    }
    let second = tokens.next();
    let pair = if reversed { (second, first) } else { (first, second) };
    match pair {
        (Some("read"), Some("me")) => 2,
        _ => 0,
    }
}

/// Normalize with the default extensions and journal codes.
pub fn normalize(text: &str) -> String {
    Normalizer::default().normalize(text)
}
