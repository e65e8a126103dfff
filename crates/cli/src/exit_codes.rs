//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args; also clap's parse errors) |
//! | 3    | Invalid match config                                 |
//! | 4    | Input/output failure (table, directory, output file) |
//! | 5    | Unmatched candidates remain under `--strict`         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use titlematch_io::IoError;
use titlematch_resolver::ResolveError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, out-of-range option values.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Reading inputs or writing outputs failed.
pub const EXIT_IO: u8 = 4;

/// `run --strict` finished but some candidates matched nothing.
pub const EXIT_UNMATCHED: u8 = 5;

/// Map an IoError to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. }
        | IoError::Write { .. }
        | IoError::MissingColumn { .. }
        | IoError::Sheet(_) => EXIT_IO,
        IoError::UnsupportedFormat(_) => EXIT_USAGE,
    }
}

/// Map a ResolveError raised while loading a config to its exit code.
pub fn config_exit_code(err: &ResolveError) -> u8 {
    match err {
        ResolveError::InvalidThreshold(_)
        | ResolveError::ConfigParse(_)
        | ResolveError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
    }
}
