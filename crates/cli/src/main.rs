// titlematch CLI - resolve downloaded files against a reference table

mod exit_codes;
mod pair;
mod run;
mod score;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use titlematch_io::IoError;
use titlematch_resolver::{MatchMode, Scorer};

use exit_codes::{io_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "titlematch")]
#[command(about = "Fuzzy-match file names and scraped titles against a reference table")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a match job from a TOML config file
    #[command(after_help = "\
Exit code 5 with --strict means some candidate files matched no reference.

Examples:
  titlematch run ecma.toml
  titlematch run ecma.toml --json
  titlematch run ecma.toml --output result.json
  titlematch run ecma.toml --dry-run -v")]
    Run {
        /// Path to the match config (.toml)
        config: PathBuf,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Resolve and report, but write no table, report or renamed files
        #[arg(long)]
        dry_run: bool,

        /// Exit non-zero when any candidate stays unmatched
        #[arg(long)]
        strict: bool,
    },

    /// Validate a match config without running
    #[command(after_help = "\
Examples:
  titlematch validate ecma.toml")]
    Validate {
        /// Path to the match config (.toml)
        config: PathBuf,
    },

    /// Score two strings after normalization
    #[command(after_help = "\
Examples:
  titlematch score 'ECMA_Revealed_Preference_Bracketing.pdf' 'Revealing Choice Bracketing'
  titlematch score 'README_Market_Design.md' 'Market Design' --scorer ratio --json")]
    Score {
        a: String,
        b: String,

        #[arg(long, value_enum, default_value_t = ScorerArg::TokenSetWinkler)]
        scorer: ScorerArg,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Pair every file in one directory with its closest file in another
    #[command(after_help = "\
Both directories are walked recursively. Rows are sorted by score, best first.

Examples:
  titlematch pair table_output_named/ readme_txt/
  titlematch pair tables/ readmes/ --threshold 85 --scorer partial-ratio -o matches.csv
  titlematch pair tables/ readmes/ --mode optimal-assignment --ext txt")]
    Pair {
        left: PathBuf,
        right: PathBuf,

        /// Minimum score (0-100) for a pair to count as matched
        #[arg(long, default_value_t = 85)]
        threshold: u8,

        #[arg(long, value_enum, default_value_t = ScorerArg::PartialRatio)]
        scorer: ScorerArg,

        #[arg(long, value_enum, default_value_t = ModeArg::GreedyIndependent)]
        mode: ModeArg,

        /// Only consider files with this extension (repeatable; default: all files)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Write pairs as CSV instead of printing them
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScorerArg {
    Ratio,
    PartialRatio,
    TokenSort,
    TokenSet,
    PartialTokenSet,
    TokenSetWinkler,
}

impl From<ScorerArg> for Scorer {
    fn from(arg: ScorerArg) -> Self {
        match arg {
            ScorerArg::Ratio => Scorer::Ratio,
            ScorerArg::PartialRatio => Scorer::PartialRatio,
            ScorerArg::TokenSort => Scorer::TokenSort,
            ScorerArg::TokenSet => Scorer::TokenSet,
            ScorerArg::PartialTokenSet => Scorer::PartialTokenSet,
            ScorerArg::TokenSetWinkler => Scorer::TokenSetWinkler,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    GreedyIndependent,
    OptimalAssignment,
    GreedyExclusive,
}

impl From<ModeArg> for MatchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::GreedyIndependent => MatchMode::GreedyIndependent,
            ModeArg::OptimalAssignment => MatchMode::OptimalAssignment,
            ModeArg::GreedyExclusive => MatchMode::GreedyExclusive,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nresolver: titlematch-resolver ", env!("CARGO_PKG_VERSION"),
        "\ntarget:   ", env!("TARGET"),
    )
}

/// `RUST_LOG` sets the baseline; each `-v` raises it.
fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let level = match verbose {
        0 => None,
        1 => Some(log::LevelFilter::Info),
        2 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            dry_run,
            strict,
        } => run::cmd_run(config, json, output, dry_run, strict),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Score { a, b, scorer, json } => score::cmd_score(&a, &b, scorer.into(), json),
        Commands::Pair {
            left,
            right,
            threshold,
            scorer,
            mode,
            extensions,
            output,
        } => pair::cmd_pair(
            left,
            right,
            threshold,
            scorer.into(),
            mode.into(),
            extensions,
            output,
        ),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = match &err {
            IoError::MissingColumn { .. } => {
                Some("set references.title_column to the header of the title column".to_string())
            }
            IoError::Sheet(_) => Some("set references.sheet to one of the listed sheets".to_string()),
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}
