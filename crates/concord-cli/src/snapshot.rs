//! The JSON input file: what the transport layer fetched from the remote store.
//!
//! Records travel as codec blobs, base64 encoded, keyed by the storage id
//! they were fetched under.

use std::path::Path;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

use concord_engine::{Manifest, SyncOutcome};
use concord_shared::codec::{decode_record, encode_record};
use concord_shared::local::SelfIdentity;
use concord_shared::{StorageId, StorageRecord};

/// One record blob as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRecord {
    pub id: StorageId,
    /// Base64 of the codec blob.
    pub data: String,
}

impl EncodedRecord {
    pub fn encode(record: &StorageRecord) -> anyhow::Result<Self> {
        let blob = encode_record(record)
            .with_context(|| format!("encoding record {}", record.id()))?;
        Ok(Self {
            id: *record.id(),
            data: STANDARD.encode(blob),
        })
    }

    pub fn decode(&self) -> anyhow::Result<StorageRecord> {
        let blob = STANDARD
            .decode(&self.data)
            .with_context(|| format!("record {} is not valid base64", self.id))?;
        decode_record(&self.id, &blob).with_context(|| format!("decoding record {}", self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The manifest version this device last synced.
    pub local_manifest: Manifest,
    pub remote_manifest: Manifest,
    /// Records fetched for the remote manifest's keys.
    #[serde(default)]
    pub records: Vec<EncodedRecord>,
    /// Creates the local account (and My Story) on a fresh database.
    #[serde(default)]
    pub account: Option<SelfIdentity>,
}

impl Snapshot {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
    }

    /// Blobs that fail to decode are skipped; the pass treats them as not
    /// delivered.
    pub fn decode_records(&self) -> Vec<StorageRecord> {
        self.records
            .iter()
            .filter_map(|encoded| match encoded.decode() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(id = %encoded.id, error = %format!("{e:#}"), "Dropping undecodable record");
                    None
                }
            })
            .collect()
    }
}

/// What gets printed: the outcome plus the blobs to upload.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub outcome: &'a SyncOutcome,
    pub upload: Vec<EncodedRecord>,
}
