//! Identifier differencing between the remote manifest and the local key set.

use std::collections::{HashMap, HashSet};

use concord_shared::{RawId, RecordType, StorageId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdDifference {
    /// Keys only the remote store has, in remote order.
    pub remote_only: Vec<StorageId>,
    /// Keys only the local store has, in local order.
    pub local_only: Vec<StorageId>,
    /// A raw id appears on both sides with different record types.
    pub has_type_mismatches: bool,
}

impl IdDifference {
    pub fn is_empty(&self) -> bool {
        self.remote_only.is_empty() && self.local_only.is_empty()
    }
}

impl std::fmt::Display for IdDifference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "remote_only: {}, local_only: {}, type_mismatches: {}",
            self.remote_only.len(),
            self.local_only.len(),
            self.has_type_mismatches
        )
    }
}

/// Index both key sets by raw id and split them.
///
/// A raw id present on both sides with different type tags is reported in
/// neither output list; it only sets `has_type_mismatches`. Duplicate ids
/// within one side are reported once.
pub fn find_id_difference(remote_ids: &[StorageId], local_ids: &[StorageId]) -> IdDifference {
    let remote_by_raw = index_by_raw(remote_ids);
    let local_by_raw = index_by_raw(local_ids);

    let mut has_type_mismatches = false;
    for (raw, remote_kind) in &remote_by_raw {
        if let Some(local_kind) = local_by_raw.get(raw) {
            if local_kind != remote_kind {
                has_type_mismatches = true;
            }
        }
    }

    IdDifference {
        remote_only: only_in(remote_ids, &local_by_raw),
        local_only: only_in(local_ids, &remote_by_raw),
        has_type_mismatches,
    }
}

fn index_by_raw(ids: &[StorageId]) -> HashMap<RawId, RecordType> {
    let mut index = HashMap::with_capacity(ids.len());
    for id in ids {
        index.entry(id.raw).or_insert(id.kind);
    }
    index
}

fn only_in(ids: &[StorageId], other: &HashMap<RawId, RecordType>) -> Vec<StorageId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| !other.contains_key(&id.raw))
        .filter(|id| seen.insert(id.raw))
        .copied()
        .collect()
}
