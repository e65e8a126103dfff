//! `titlematch pair`: file-to-file pairing between two directories.

use std::path::PathBuf;

use serde::Serialize;
use titlematch_io::{export, list_candidates};
use titlematch_resolver::{MatchMode, Resolver, Scorer};

use crate::CliError;

#[derive(Debug, Serialize)]
struct PairRow {
    left: String,
    /// Best right-hand file, also reported when under the threshold.
    /// Empty when every right-hand file scored 0.
    right: Option<String>,
    score: u8,
    matched: bool,
}

pub fn cmd_pair(
    left_dir: PathBuf,
    right_dir: PathBuf,
    threshold: u8,
    scorer: Scorer,
    mode: MatchMode,
    extensions: Vec<String>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    if threshold > 100 {
        return Err(CliError::usage(format!(
            "--threshold must be between 0 and 100, got {threshold}"
        )));
    }

    let left = list_candidates(&left_dir, &extensions, true)?;
    let right = list_candidates(&right_dir, &extensions, true)?;
    let left_names: Vec<&str> = left.iter().map(|f| f.file_name.as_str()).collect();
    let right_names: Vec<&str> = right.iter().map(|f| f.file_name.as_str()).collect();

    let resolver = Resolver {
        scorer,
        ..Resolver::default()
    };
    let results = resolver
        .resolve_batch(&left_names, &right_names, threshold, mode)
        .map_err(|e| CliError::usage(e.to_string()))?;

    let mut rows: Vec<PairRow> = left_names
        .iter()
        .zip(&results)
        .map(|(name, result)| {
            // Unmatched rows still show the closest file for manual review,
            // unless nothing scored at all.
            let right_idx = if result.matched {
                result.reference
            } else if result.score == 0 {
                None
            } else {
                resolver
                    .resolve_one(name, &right_names, 0)
                    .ok()
                    .and_then(|best| best.reference)
            };
            PairRow {
                left: name.to_string(),
                right: right_idx.map(|i| right_names[i].to_string()),
                score: result.score,
                matched: result.matched,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.left.cmp(&b.left)));

    let matched = rows.iter().filter(|r| r.matched).count();

    match output {
        Some(ref path) => {
            export::write_csv_rows(path, &rows)?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            for row in &rows {
                println!(
                    "{:>3}  {}  ->  {}",
                    row.score,
                    row.left,
                    row.right.as_deref().unwrap_or("NO_MATCH")
                );
            }
        }
    }

    eprintln!(
        "{} left files, {} right files: {} paired at score >= {} ({} mode, {} scorer)",
        rows.len(),
        right.len(),
        matched,
        threshold,
        mode,
        scorer
    );
    Ok(())
}
