//! Mapping SQLite failures into storage errors.

use livequiz_core::StorageError;
use rusqlite::ErrorCode;

/// Classify a rusqlite error raised while working on `table`.
///
/// Lock contention is reported as unavailable so callers can retry;
/// row conversion failures are reported as corrupt rows.
pub(crate) fn storage_error(table: &str, err: rusqlite::Error) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            StorageError::Unavailable {
                message: err.to_string(),
            }
        }
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => StorageError::Corrupt {
            table: table.to_string(),
            message: err.to_string(),
        },
        _ => StorageError::from_source(err),
    }
}
