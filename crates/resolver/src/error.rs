use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Acceptance threshold outside 0..=100.
    InvalidThreshold(u8),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, bad output format, etc.).
    ConfigValidation(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreshold(t) => {
                write!(f, "threshold must be between 0 and 100, got {t}")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Fail fast on a threshold the caller should never have passed.
pub(crate) fn check_threshold(threshold: u8) -> Result<(), ResolveError> {
    if threshold > 100 {
        return Err(ResolveError::InvalidThreshold(threshold));
    }
    Ok(())
}
