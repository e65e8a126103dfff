//! `titlematch run` / `titlematch validate`: config-driven match jobs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use titlematch_io::{export, naming, CandidateFile, ReferenceTable, ReportRow};
use titlematch_resolver::{summarize, BatchSummary, MatchConfig, MatchResult, Resolver, Scorer};

use crate::exit_codes::{config_exit_code, EXIT_IO, EXIT_UNMATCHED};
use crate::CliError;

/// JSON document printed by `run --json` / written by `run --output`.
#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    name: &'a str,
    scorer: Scorer,
    dry_run: bool,
    summary: BatchSummary,
    matches: &'a [ReportRow],
    /// Reference rows no candidate matched, by title.
    missing_references: Vec<&'a str>,
    renamed: Vec<Renamed>,
}

#[derive(Debug, Serialize)]
struct Renamed {
    from: String,
    to: String,
}

fn load_config(config_path: &Path) -> Result<MatchConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_IO, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    MatchConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(config_exit_code(&e), e.to_string()))
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "{}: ok (threshold {}, {} mode, {} scorer)",
        config.name, config.resolver.threshold, config.resolver.mode, config.resolver.scorer
    );
    Ok(())
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    dry_run: bool,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let table = titlematch_io::load_references(
        &base_dir.join(&config.references.file),
        config.references.sheet.as_deref(),
        &config.references.title_column,
    )?;
    let files = titlematch_io::list_candidates(
        &base_dir.join(&config.candidates.dir),
        &config.candidates.extensions,
        config.candidates.recursive,
    )?;

    let resolver = Resolver::from_config(&config.resolver);
    let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
    let threshold = config.resolver.threshold;
    let mode = config.resolver.mode;
    let results = resolver
        .resolve_batch(&names, &table.titles(), threshold, mode)
        .map_err(|e| CliError::new(config_exit_code(&e), e.to_string()))?;

    let summary = summarize(&results, table.len(), threshold, mode);
    let report: Vec<ReportRow> = files
        .iter()
        .zip(&results)
        .map(|(file, result)| ReportRow::new(file, result, &table))
        .collect();

    let renamed = if dry_run {
        eprintln!("dry run: no files written");
        plan_renames(&config, base_dir, &files, &results, &table)
    } else {
        write_outputs(&config, base_dir, &files, &results, &report, &table)?
    };

    let scores = export::reference_scores(table.len(), &results);
    let output = RunOutput {
        name: &config.name,
        scorer: config.resolver.scorer,
        dry_run,
        summary: summary.clone(),
        matches: &report,
        missing_references: table
            .rows
            .iter()
            .zip(&scores)
            .filter(|(_, s)| s.is_none())
            .map(|(r, _)| r.title.as_str())
            .collect(),
        renamed,
    };

    if json_output || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::other(format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = output_file {
            std::fs::write(path, &json_str).map_err(|e| {
                CliError::new(EXIT_IO, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    eprintln!(
        "{}: {} candidates, {} matched, {} unmatched; {} of {} references claimed ({} mode, threshold {})",
        config.name,
        summary.candidates,
        summary.matched,
        summary.unmatched,
        summary.references_claimed,
        summary.references,
        summary.mode,
        summary.threshold,
    );
    if !output.renamed.is_empty() {
        let verb = if dry_run { "would copy" } else { "copied" };
        eprintln!("{verb} {} matched files under their titles", output.renamed.len());
    }

    if strict && summary.unmatched > 0 {
        return Err(CliError::new(
            EXIT_UNMATCHED,
            format!("{} candidate files matched no reference", summary.unmatched),
        )
        .with_hint("lower resolver.threshold or inspect output.report"));
    }
    Ok(())
}

fn matched_pairs<'a>(
    files: &'a [CandidateFile],
    results: &'a [MatchResult],
    table: &'a ReferenceTable,
) -> impl Iterator<Item = (&'a CandidateFile, &'a str)> + 'a {
    files.iter().zip(results).filter_map(move |(file, result)| {
        let idx = result.reference.filter(|_| result.matched)?;
        table.rows.get(idx).map(|r| (file, r.title.as_str()))
    })
}

fn plan_renames(
    config: &MatchConfig,
    base_dir: &Path,
    files: &[CandidateFile],
    results: &[MatchResult],
    table: &ReferenceTable,
) -> Vec<Renamed> {
    let Some(ref dir) = config.output.rename_dir else {
        return Vec::new();
    };
    let dir = base_dir.join(dir);
    let mut claimed = HashSet::new();
    matched_pairs(files, results, table)
        .filter_map(|(file, title)| {
            let prefix = &config.output.rename_prefix;
            let to = naming::plan_titled(&dir, prefix, title, file, &mut claimed)?;
            Some(Renamed {
                from: file.path.display().to_string(),
                to: to.display().to_string(),
            })
        })
        .collect()
}

fn write_outputs(
    config: &MatchConfig,
    base_dir: &Path,
    files: &[CandidateFile],
    results: &[MatchResult],
    report: &[ReportRow],
    table: &ReferenceTable,
) -> Result<Vec<Renamed>, CliError> {
    let out = &config.output;

    if let Some(ref path) = out.table {
        let path = base_dir.join(path);
        export::write_flagged_table(
            &path,
            table,
            results,
            &out.flag_column,
            out.score_column.as_deref(),
        )?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = out.unmatched {
        let path = base_dir.join(path);
        let unmatched = files
            .iter()
            .zip(results)
            .filter(|(_, r)| !r.matched)
            .map(|(f, _)| f);
        export::write_unmatched(&path, unmatched)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = out.report {
        let path = base_dir.join(path);
        export::write_report(&path, report)?;
        eprintln!("wrote {}", path.display());
    }

    let mut renamed = Vec::new();
    if let Some(ref dir) = out.rename_dir {
        let dir = base_dir.join(dir);
        for (file, title) in matched_pairs(files, results, table) {
            if let Some(to) = naming::copy_titled(&dir, &out.rename_prefix, title, file)? {
                renamed.push(Renamed {
                    from: file.path.display().to_string(),
                    to: to.display().to_string(),
                });
            }
        }
    }
    Ok(renamed)
}
