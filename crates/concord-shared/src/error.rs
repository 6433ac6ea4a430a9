use thiserror::Error;

use crate::ids::StorageId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid identifier length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Base64 decode error")]
    Base64Decode,
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Record serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Record body belongs to {found}, expected {expected}")]
    IdMismatch { expected: StorageId, found: StorageId },

    #[error("Record {0} has a known type but no matching body")]
    MissingBody(StorageId),
}
