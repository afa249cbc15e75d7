//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 1    | General error (unspecified)                                  |
//! | 2    | Usage error (bad args, unknown report, unparseable value)    |
//! | 3    | Invalid pipeline config                                      |
//! | 4    | Input table lacks a required column                          |
//! | 5    | File or database could not be read or written                |
//! | 6    | Store constraint fired while loading cleaned data            |
//! | 7    | Single-row write rejected by a key, FK or check constraint   |
//! | 8    | Addressed row does not exist                                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the mapping functions below

use foodshare_clean::CleanError;
use foodshare_io::IoError;
use foodshare_store::StoreError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// An input CSV is missing a required column. The run produced nothing.
pub const EXIT_MISSING_COLUMN: u8 = 4;

/// Reading inputs or writing artifacts / the store failed.
pub const EXIT_IO: u8 = 5;

/// A store constraint fired during the bulk load (upstream filtering bug).
pub const EXIT_STORE_INTEGRITY: u8 = 6;

/// A write would have violated a declared constraint.
pub const EXIT_WRITE_REJECTED: u8 = 7;

/// Listing or claim id not present in the store.
pub const EXIT_NOT_FOUND: u8 = 8;

pub fn clean_exit_code(err: &CleanError) -> u8 {
    match err {
        CleanError::ConfigParse(_) | CleanError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        CleanError::MissingColumns { .. } => EXIT_MISSING_COLUMN,
        CleanError::Csv { .. } | CleanError::Io(_) => EXIT_IO,
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::Write { .. } => EXIT_IO,
        IoError::Clean(e) => clean_exit_code(e),
    }
}

pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Sqlite(_) | StoreError::Io { .. } => EXIT_IO,
        StoreError::Integrity { .. } => EXIT_STORE_INTEGRITY,
        StoreError::Rejected(_) => EXIT_WRITE_REJECTED,
        StoreError::NotFound { .. } => EXIT_NOT_FOUND,
        StoreError::InvalidInput(_) => EXIT_USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_map_to_their_own_code() {
        let err = IoError::Clean(CleanError::MissingColumns {
            table: "Claims".into(),
            columns: vec!["Status".into()],
        });
        assert_eq!(io_exit_code(&err), EXIT_MISSING_COLUMN);
    }

    #[test]
    fn store_codes() {
        assert_eq!(store_exit_code(&StoreError::Rejected("fk".into())), EXIT_WRITE_REJECTED);
        assert_eq!(
            store_exit_code(&StoreError::NotFound { entity: "Claims", id: 1 }),
            EXIT_NOT_FOUND
        );
    }
}
