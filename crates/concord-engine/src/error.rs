use thiserror::Error;

use concord_shared::{IdError, StorageId};

/// Errors that abort a whole reconciliation pass.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local store failed.
    #[error("Local store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The proposed write operation broke an invariant.
    #[error("Write operation rejected: {0}")]
    Validation(#[from] ValidationError),

    /// A record was accepted as valid but its identifiers failed to decode.
    #[error("Identifier error: {0}")]
    Id(#[from] IdError),

    /// The remote store carries My Story but the local store never created it.
    #[error("My Story distribution list is missing locally")]
    MissingMyStory,

    /// The account row always exists; an insert means local state is corrupt.
    #[error("Attempted to insert a local account record")]
    UnexpectedAccountInsert,

    /// A local key is listed but no row owns it.
    #[error("No local row owns storage id {0}")]
    MissingLocalRecord(StorageId),

    /// The remote manifest is already at the largest representable version.
    #[error("Manifest version {0} cannot be incremented")]
    ManifestVersionOverflow(u64),
}

impl SyncError {
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }
}

/// Invariant violations found in a proposed write operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Manifest version {actual} does not follow previous version {previous}")]
    IncorrectManifestVersion { previous: u64, actual: u64 },

    #[error("Manifest lists storage id {0} more than once")]
    DuplicateIdInManifest(StorageId),

    #[error("Manifest has no account record")]
    MissingAccount,

    #[error("Manifest has {0} account records")]
    MultipleAccounts(usize),

    #[error("Storage id {0} is inserted more than once")]
    DuplicateInsert(StorageId),

    #[error("Inserted storage id {0} is not in the manifest")]
    InsertNotPresentInFullIdSet(StorageId),

    #[error("Deleted storage id {0} is still in the manifest")]
    DeletePresentInFullIdSet(StorageId),

    #[error("Storage id {0} is both inserted and deleted")]
    InsertInDeleteSet(StorageId),

    #[error("Contact insert {0} refers to the local account")]
    SelfAddedAsContact(StorageId),

    #[error("Insert {0} is a record of unknown type")]
    UnknownInsert(StorageId),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;
