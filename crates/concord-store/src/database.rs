//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. Reconciliation passes go
//! through [`Database::begin_sync`], which hands out a [`SyncTransaction`]
//! implementing the engine's `LocalStore`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{Connection, Transaction};
use uuid::Uuid;

use concord_shared::RawId;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/concord/concord.db`
    /// - macOS:   `~/Library/Application Support/org.concord.concord/concord.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\concord\concord\data\concord.db`
    pub fn new() -> Result<Self> {
        let db_path = default_path()?;
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// A throwaway database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Start a reconciliation pass. Nothing is written until
    /// [`SyncTransaction::commit`]; dropping the transaction rolls it back.
    pub fn begin_sync(&mut self) -> Result<SyncTransaction<'_>> {
        let tx = self.conn.transaction()?;
        Ok(SyncTransaction { tx })
    }

    /// Run `f` inside one transaction, committing only if it succeeds.
    pub fn sync_transaction<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut SyncTransaction<'_>) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let mut tx = self.begin_sync()?;
        let value = f(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Platform default location of the database file.
pub fn default_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("org", "concord", "concord").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().join("concord.db"))
}

/// An open reconciliation pass over the database.
pub struct SyncTransaction<'a> {
    tx: Transaction<'a>,
}

impl SyncTransaction<'_> {
    pub(crate) fn conn(&self) -> &Connection {
        &self.tx
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        tracing::debug!("sync transaction committed");
        Ok(())
    }

    pub fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        tracing::debug!("sync transaction rolled back");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Column helpers
// ---------------------------------------------------------------------------

pub(crate) fn conversion_err<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

pub(crate) fn raw_to_sql(raw: Option<&RawId>) -> Option<String> {
    raw.map(RawId::to_hex)
}

pub(crate) fn raw_from_sql(idx: usize, value: Option<String>) -> rusqlite::Result<Option<RawId>> {
    value
        .map(|s| {
            let bytes = hex::decode(&s).map_err(|e| conversion_err(idx, e))?;
            RawId::from_slice(&bytes).map_err(|e| conversion_err(idx, e))
        })
        .transpose()
}

pub(crate) fn uuid_from_sql(idx: usize, value: Option<String>) -> rusqlite::Result<Option<Uuid>> {
    value
        .map(|s| Uuid::parse_str(&s).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

pub(crate) fn bytes_from_hex(idx: usize, value: &str) -> rusqlite::Result<Vec<u8>> {
    hex::decode(value).map_err(|e| conversion_err(idx, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());
    }

    #[test]
    fn raw_id_column_helpers() {
        let raw = RawId([0x3C; 16]);
        let stored = raw_to_sql(Some(&raw));
        assert_eq!(raw_from_sql(0, stored).unwrap(), Some(raw));
        assert_eq!(raw_from_sql(0, None).unwrap(), None);
        assert!(raw_from_sql(0, Some("abcd".into())).is_err());
    }
}
