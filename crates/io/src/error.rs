use std::fmt;
use std::path::{Path, PathBuf};

use foodshare_clean::CleanError;

#[derive(Debug)]
pub enum IoError {
    /// Input file could not be opened or read.
    Read { path: PathBuf, message: String },
    /// Output artifact could not be created or written.
    Write { path: PathBuf, message: String },
    /// Input parsed but failed a table-level check.
    Clean(CleanError),
}

impl IoError {
    pub(crate) fn read(path: &Path, err: impl fmt::Display) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(path: &Path, err: impl fmt::Display) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
            Self::Clean(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<CleanError> for IoError {
    fn from(e: CleanError) -> Self {
        Self::Clean(e)
    }
}
