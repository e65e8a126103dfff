use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    Read { path: String, message: String },
    Write { path: String, message: String },
    MissingColumn { path: String, column: String },
    UnsupportedFormat(String),
    Sheet(String),
}

impl IoError {
    pub(crate) fn read(path: &Path, e: impl fmt::Display) -> Self {
        Self::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }

    pub(crate) fn write(path: &Path, e: impl fmt::Display) -> Self {
        Self::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "failed to read {path}: {message}"),
            Self::Write { path, message } => write!(f, "failed to write {path}: {message}"),
            Self::MissingColumn { path, column } => {
                write!(f, "{path}: no column named '{column}'")
            }
            Self::UnsupportedFormat(ext) => write!(f, "unsupported file format '{ext}'"),
            Self::Sheet(msg) => write!(f, "sheet error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}
