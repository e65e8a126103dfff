use serde::Deserialize;

use crate::error::{check_threshold, ResolveError};
use crate::model::MatchMode;
use crate::normalize::Normalizer;
use crate::similarity::Scorer;

pub const REFERENCE_FORMATS: &[&str] = &["csv", "tsv", "txt", "xlsx", "xlsm", "xlsb", "xls", "ods"];
pub const TABLE_OUTPUT_FORMATS: &[&str] = &["csv", "xlsx"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A match job: which table, which files, how to resolve, where to write.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    pub name: String,
    pub references: ReferenceConfig,
    pub candidates: CandidateConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    pub file: String,
    /// Worksheet name; first sheet when omitted. Ignored for CSV.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_title_column")]
    pub title_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateConfig {
    pub dir: String,
    #[serde(default = "default_candidate_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
}

fn default_title_column() -> String {
    "title".into()
}

fn default_candidate_extensions() -> Vec<String> {
    vec!["pdf".into()]
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub scorer: Scorer,
    /// Replaces the default journal codes when set.
    #[serde(default)]
    pub journal_codes: Option<Vec<String>>,
    /// Replaces the default stripped extensions when set.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

fn default_threshold() -> u8 {
    90
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            mode: MatchMode::default(),
            scorer: Scorer::default(),
            journal_codes: None,
            extensions: None,
        }
    }
}

impl ResolverConfig {
    pub fn normalizer(&self) -> Normalizer {
        let defaults = Normalizer::default();
        Normalizer::new(
            self.extensions.clone().unwrap_or(defaults.extensions),
            self.journal_codes.clone().unwrap_or(defaults.journal_codes),
        )
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        check_threshold(self.threshold)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Reference table re-written with the flag column (csv or xlsx).
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_flag_column")]
    pub flag_column: String,
    #[serde(default)]
    pub score_column: Option<String>,
    /// CSV of candidate files nothing matched.
    #[serde(default)]
    pub unmatched: Option<String>,
    /// CSV with one line per candidate.
    #[serde(default)]
    pub report: Option<String>,
    /// Matched candidates are copied here, named after their reference title.
    #[serde(default)]
    pub rename_dir: Option<String>,
    #[serde(default)]
    pub rename_prefix: String,
}

fn default_flag_column() -> String {
    "downloaded".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table: None,
            flag_column: default_flag_column(),
            score_column: None,
            unmatched: None,
            report: None,
            rename_dir: None,
            rename_prefix: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, ResolveError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| ResolveError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.name.trim().is_empty() {
            return Err(ResolveError::ConfigValidation("name must not be empty".into()));
        }

        if self.references.file.trim().is_empty() {
            return Err(ResolveError::ConfigValidation(
                "references.file must not be empty".into(),
            ));
        }
        let ext = extension_of(&self.references.file);
        if !REFERENCE_FORMATS.contains(&ext.as_str()) {
            return Err(ResolveError::ConfigValidation(format!(
                "references.file: unsupported format '{ext}' (expected one of {})",
                REFERENCE_FORMATS.join(", ")
            )));
        }
        if self.references.title_column.trim().is_empty() {
            return Err(ResolveError::ConfigValidation(
                "references.title_column must not be empty".into(),
            ));
        }

        if self.candidates.dir.trim().is_empty() {
            return Err(ResolveError::ConfigValidation(
                "candidates.dir must not be empty".into(),
            ));
        }
        if self.candidates.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ResolveError::ConfigValidation(
                "candidates.extensions needs at least one extension".into(),
            ));
        }

        self.resolver.validate()?;

        if self.output.flag_column.trim().is_empty() {
            return Err(ResolveError::ConfigValidation(
                "output.flag_column must not be empty".into(),
            ));
        }
        if let Some(ref table) = self.output.table {
            let ext = extension_of(table);
            if !TABLE_OUTPUT_FORMATS.contains(&ext.as_str()) {
                return Err(ResolveError::ConfigValidation(format!(
                    "output.table: unsupported format '{ext}' (expected csv or xlsx)"
                )));
            }
        }
        if let Some(bad) = self
            .output
            .rename_prefix
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '(' | ')')))
        {
            return Err(ResolveError::ConfigValidation(format!(
                "output.rename_prefix: character {bad:?} is not allowed in file names"
            )));
        }

        Ok(())
    }
}

/// Lower-cased extension of a path-like string, "" when there is none.
pub fn extension_of(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "ECMA"

[references]
file = "Econometrica_2000-2025.xlsx"

[candidates]
dir = "papers_pdfs/ECMA"
"#;

    #[test]
    fn minimal_uses_defaults() {
        let config = MatchConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.references.title_column, "title");
        assert_eq!(config.candidates.extensions, vec!["pdf".to_string()]);
        assert!(!config.candidates.recursive);
        assert_eq!(config.resolver, ResolverConfig::default());
        assert_eq!(config.resolver.threshold, 90);
        assert_eq!(config.output.flag_column, "downloaded");
        assert!(config.output.table.is_none());
    }

    #[test]
    fn full_config() {
        let toml = r#"
name = "ECMA"

[references]
file = "refs.csv"
sheet = "Sheet1"
title_column = "Title"

[candidates]
dir = "pdfs"
extensions = ["pdf", "PDF"]
recursive = true

[resolver]
threshold = 85
mode = "optimal_assignment"
scorer = "token_set"
journal_codes = ["ecma"]

[output]
table = "out.xlsx"
flag_column = "supplementary_package"
score_column = "match_score"
unmatched = "unmatched.csv"
report = "report.csv"
rename_dir = "renamed"
rename_prefix = "ECMA_"
"#;
        let config = MatchConfig::from_toml(toml).unwrap();
        assert_eq!(config.resolver.mode, MatchMode::OptimalAssignment);
        assert_eq!(config.resolver.scorer, Scorer::TokenSet);
        assert_eq!(config.resolver.threshold, 85);
        let n = config.resolver.normalizer();
        assert_eq!(n.journal_codes, vec!["ecma".to_string()]);
        assert_eq!(n.extensions, Normalizer::default().extensions);
        assert_eq!(config.output.score_column.as_deref(), Some("match_score"));
        assert_eq!(config.output.rename_dir.as_deref(), Some("renamed"));
        assert_eq!(config.output.rename_prefix, "ECMA_");
    }

    #[test]
    fn rename_prefix_must_be_file_safe() {
        let toml = format!("{MINIMAL}\n[output]\nrename_prefix = \"ECMA/\"\n");
        let err = MatchConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("rename_prefix"), "{err}");
    }

    #[test]
    fn threshold_over_100_rejected() {
        let toml = format!("{MINIMAL}\n[resolver]\nthreshold = 120\n");
        let err = MatchConfig::from_toml(&toml).unwrap_err();
        assert_eq!(err, ResolveError::InvalidThreshold(120));
    }

    #[test]
    fn unknown_mode_is_parse_error() {
        let toml = format!("{MINIMAL}\n[resolver]\nmode = \"best_effort\"\n");
        assert!(matches!(
            MatchConfig::from_toml(&toml),
            Err(ResolveError::ConfigParse(_))
        ));
    }

    #[test]
    fn bad_output_format() {
        let toml = format!("{MINIMAL}\n[output]\ntable = \"out.json\"\n");
        let err = MatchConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("output.table"), "{err}");
    }

    #[test]
    fn bad_reference_format() {
        let toml = MINIMAL.replace("Econometrica_2000-2025.xlsx", "refs.parquet");
        let err = MatchConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("parquet"), "{err}");
    }

    #[test]
    fn empty_name_rejected() {
        let toml = MINIMAL.replace("name = \"ECMA\"", "name = \"  \"");
        assert!(matches!(
            MatchConfig::from_toml(&toml),
            Err(ResolveError::ConfigValidation(_))
        ));
    }

    #[test]
    fn empty_extension_list_rejected() {
        let toml = MINIMAL.replace("dir = \"papers_pdfs/ECMA\"", "dir = \"x\"\nextensions = []");
        assert!(matches!(
            MatchConfig::from_toml(&toml),
            Err(ResolveError::ConfigValidation(_))
        ));
    }
}
