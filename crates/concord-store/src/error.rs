use thiserror::Error;

use concord_engine::SyncError;
use concord_shared::IdError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The local account row has not been created yet.
    #[error("Local account not initialised")]
    NoLocalAccount,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Structured column (settings, member list) failed to (de)serialize.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored identifier has the wrong shape.
    #[error("Stored identifier error: {0}")]
    Id(#[from] IdError),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::store(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_error_surfaces_as_sync_store_error() {
        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().starts_with("Database error"));

        let sync: SyncError = err.into();
        assert!(matches!(sync, SyncError::Store(_)));
        assert!(sync.to_string().starts_with("Local store error: Database error"));
    }
}
