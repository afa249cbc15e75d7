use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    /// Any SQLite failure not covered below.
    Sqlite(rusqlite::Error),
    /// A constraint fired while loading cleaned data. Indicates a pipeline bug.
    Integrity { table: String, message: String },
    /// A single-row write would violate a declared key, FK or check constraint.
    Rejected(String),
    /// The addressed row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Caller-supplied value is unusable (missing report parameter, etc.).
    InvalidInput(String),
    /// The store file is missing or cannot be replaced.
    Io { path: PathBuf, message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite error: {e}"),
            Self::Integrity { table, message } => {
                write!(f, "integrity violation while loading {table}: {message}")
            }
            Self::Rejected(msg) => write!(f, "write rejected: {msg}"),
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Map constraint failures on a single-row write to [`StoreError::Rejected`].
pub(crate) fn write_error(e: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&e) {
        StoreError::Rejected(e.to_string())
    } else {
        StoreError::Sqlite(e)
    }
}
