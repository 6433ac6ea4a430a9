//! Record blob codec.
//!
//! A record blob is the bincode encoding of its [`StorageRecord`]. Blobs for
//! ids of an unknown type are never decoded: the bytes are kept as-is so they
//! can be retained and handed back unchanged.

use crate::error::CodecError;
use crate::ids::StorageId;
use crate::records::{StorageRecord, UnknownRecord};

pub fn encode_record(record: &StorageRecord) -> Result<Vec<u8>, CodecError> {
    match record {
        StorageRecord::Unknown(unknown) => Ok(unknown.data.clone()),
        known => Ok(bincode::serialize(known)?),
    }
}

/// Decode the blob stored under `id`.
pub fn decode_record(id: &StorageId, bytes: &[u8]) -> Result<StorageRecord, CodecError> {
    if id.is_unknown() {
        return Ok(StorageRecord::Unknown(UnknownRecord {
            id: *id,
            data: bytes.to_vec(),
        }));
    }

    let record: StorageRecord = bincode::deserialize(bytes)?;

    if record.body_kind() != Some(id.kind) {
        return Err(CodecError::MissingBody(*id));
    }
    if record.id() != id {
        return Err(CodecError::IdMismatch {
            expected: *id,
            found: *record.id(),
        });
    }

    Ok(record)
}
