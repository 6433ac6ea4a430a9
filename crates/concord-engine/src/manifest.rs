use serde::{Deserialize, Serialize};

use concord_shared::{RawId, RecordType, StorageId, StorageRecord};

/// The full, ordered key list of the remote store at a given version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u64,
    pub storage_ids: Vec<StorageId>,
}

impl Manifest {
    pub fn new(version: u64, storage_ids: Vec<StorageId>) -> Self {
        Self {
            version,
            storage_ids,
        }
    }

    pub fn account_ids(&self) -> impl Iterator<Item = &StorageId> {
        self.storage_ids
            .iter()
            .filter(|id| id.kind == RecordType::Account)
    }
}

/// What has to be written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOperationResult {
    pub manifest: Manifest,
    pub inserts: Vec<StorageRecord>,
    pub deletes: Vec<RawId>,
}

impl WriteOperationResult {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }
}

impl std::fmt::Display for WriteOperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ManifestVersion: {}, Total Keys: {}, Inserts: {}, Deletes: {}",
            self.manifest.version,
            self.manifest.storage_ids.len(),
            self.inserts.len(),
            self.deletes.len()
        )
    }
}
