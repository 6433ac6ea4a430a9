//! The generic per-record reconciliation loop.
//!
//! Every record kind runs through [`process`]; the kind-specific behavior
//! lives behind [`RecordProcessor`].

use std::collections::HashSet;
use std::hash::Hash;

use serde::Serialize;
use tracing::{debug, info, warn};

use concord_shared::{
    AccountRecord, ContactRecord, DistributionListRecord, GroupV1Record, GroupV2Record,
    KeyGenerator, RecordType, StorageId,
};

use crate::error::Result;

/// A typed record that carries its own storage key.
pub trait SyncRecord: Clone + PartialEq + std::fmt::Debug {
    fn storage_id(&self) -> &StorageId;
    fn set_storage_id(&mut self, id: StorageId);
}

macro_rules! impl_sync_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SyncRecord for $ty {
                fn storage_id(&self) -> &StorageId {
                    &self.id
                }

                fn set_storage_id(&mut self, id: StorageId) {
                    self.id = id;
                }
            }
        )*
    };
}

impl_sync_record!(
    AccountRecord,
    ContactRecord,
    GroupV1Record,
    GroupV2Record,
    DistributionListRecord,
);

/// A local row moving from one projection to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate<R> {
    pub old: R,
    pub new: R,
}

pub trait RecordProcessor {
    type Record: SyncRecord;
    /// Canonical "same logical entity" value used for collision detection.
    type Identity: Eq + Hash;

    fn kind(&self) -> RecordType;

    /// May observe earlier calls in the same batch.
    fn is_invalid(&mut self, remote: &Self::Record) -> Result<bool>;

    /// Project the matching local row, assigning it a key first if it has none.
    fn find_local_match(
        &mut self,
        remote: &Self::Record,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Option<Self::Record>>;

    /// Pure and deterministic apart from a fresh key for a synthesized result.
    fn merge(
        &self,
        remote: &Self::Record,
        local: &Self::Record,
        keys: &mut dyn KeyGenerator,
    ) -> Self::Record;

    fn insert_local(&mut self, record: Self::Record) -> Result<()>;

    fn update_local(&mut self, update: RecordUpdate<Self::Record>) -> Result<()>;

    fn identity(&self, record: &Self::Record) -> Self::Identity;

    fn identity_equal(&self, a: &Self::Record, b: &Self::Record) -> bool {
        self.identity(a) == self.identity(b)
    }
}

/// Settle a merged record's key.
///
/// A result equal to one side takes that side's key, so it compares equal
/// to it; anything else is a new record and gets a fresh key.
pub fn resolve_merge<R: SyncRecord>(
    mut merged: R,
    remote: &R,
    local: &R,
    keys: &mut dyn KeyGenerator,
) -> R {
    merged.set_storage_id(*remote.storage_id());
    if merged == *remote {
        return merged;
    }

    merged.set_storage_id(*local.storage_id());
    if merged == *local {
        return merged;
    }

    merged.set_storage_id(remote.storage_id().with_raw(keys.generate()));
    merged
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub kind: Option<RecordType>,
    pub invalid: usize,
    pub inserted: usize,
    pub remote_wins: usize,
    pub local_wins: usize,
    pub merged: usize,
    pub duplicates: usize,
}

impl ProcessReport {
    pub fn total(&self) -> usize {
        self.invalid + self.inserted + self.remote_wins + self.local_wins + self.merged + self.duplicates
    }

    /// Whether any local row was written.
    pub fn changed_local(&self) -> bool {
        self.inserted + self.remote_wins + self.merged > 0
    }
}

impl std::fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid: {}, inserted: {}, remote_wins: {}, local_wins: {}, merged: {}, duplicates: {}",
            self.invalid, self.inserted, self.remote_wins, self.local_wins, self.merged, self.duplicates
        )
    }
}

/// Reconcile one batch of remote records of a single kind, in input order.
pub fn process<P: RecordProcessor>(
    processor: &mut P,
    remote_records: Vec<P::Record>,
    keys: &mut dyn KeyGenerator,
) -> Result<ProcessReport> {
    let kind = processor.kind();
    let mut report = ProcessReport {
        kind: Some(kind),
        ..ProcessReport::default()
    };
    let mut claimed: HashSet<P::Identity> = HashSet::new();

    for remote in remote_records {
        if processor.is_invalid(&remote)? {
            warn!(id = %remote.storage_id(), "Found invalid key! Ignoring it.");
            report.invalid += 1;
            continue;
        }

        let Some(local) = processor.find_local_match(&remote, keys)? else {
            debug!(id = %remote.storage_id(), "No local match, inserting");
            claimed.insert(processor.identity(&remote));
            processor.insert_local(remote)?;
            report.inserted += 1;
            continue;
        };

        if !claimed.insert(processor.identity(&local)) {
            warn!(
                id = %remote.storage_id(),
                local = %local.storage_id(),
                "Multiple remote records map to the same local record! Ignoring this one."
            );
            report.duplicates += 1;
            continue;
        }

        let merged = processor.merge(&remote, &local, keys);

        if merged == remote {
            debug!(id = %remote.storage_id(), "Remote record wins");
            report.remote_wins += 1;
            // The row now projects as the remote record.
            claimed.insert(processor.identity(&remote));
            processor.update_local(RecordUpdate {
                old: local,
                new: remote,
            })?;
        } else if merged == local {
            debug!(id = %local.storage_id(), "Local record wins");
            report.local_wins += 1;
        } else {
            debug!(
                remote = %remote.storage_id(),
                local = %local.storage_id(),
                merged = %merged.storage_id(),
                "Merged record gets a new key"
            );
            report.merged += 1;
            claimed.insert(processor.identity(&merged));
            processor.update_local(RecordUpdate {
                old: local,
                new: merged,
            })?;
        }
    }

    info!(kind = %kind, %report, "Processed remote records");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_shared::{RawId, SequentialKeyGenerator};
    use std::collections::HashMap;
    use tracing_test::traced_test;

    /// A processor over group V1 records keyed in a map by group id byte.
    #[derive(Default)]
    struct MapProcessor {
        rows: HashMap<u8, GroupV1Record>,
        inserts: Vec<GroupV1Record>,
        updates: Vec<RecordUpdate<GroupV1Record>>,
    }

    impl RecordProcessor for MapProcessor {
        type Record = GroupV1Record;
        type Identity = u8;

        fn kind(&self) -> RecordType {
            RecordType::GroupV1
        }

        fn is_invalid(&mut self, remote: &GroupV1Record) -> Result<bool> {
            Ok(remote.group_id.is_empty())
        }

        fn find_local_match(
            &mut self,
            remote: &GroupV1Record,
            _keys: &mut dyn KeyGenerator,
        ) -> Result<Option<GroupV1Record>> {
            Ok(self.rows.get(&remote.group_id[0]).cloned())
        }

        fn merge(
            &self,
            remote: &GroupV1Record,
            local: &GroupV1Record,
            keys: &mut dyn KeyGenerator,
        ) -> GroupV1Record {
            let merged = GroupV1Record {
                blocked: remote.blocked,
                archived: remote.archived || local.archived,
                ..remote.clone()
            };
            resolve_merge(merged, remote, local, keys)
        }

        fn insert_local(&mut self, record: GroupV1Record) -> Result<()> {
            self.rows.insert(record.group_id[0], record.clone());
            self.inserts.push(record);
            Ok(())
        }

        fn update_local(&mut self, update: RecordUpdate<GroupV1Record>) -> Result<()> {
            self.rows.insert(update.new.group_id[0], update.new.clone());
            self.updates.push(update);
            Ok(())
        }

        fn identity(&self, record: &GroupV1Record) -> u8 {
            record.group_id[0]
        }
    }

    fn record(key: u8, group: u8) -> GroupV1Record {
        GroupV1Record::new(StorageId::for_group_v1(RawId([key; 16])), vec![group; 16])
    }

    #[test]
    fn test_insert_when_unmatched() {
        let mut processor = MapProcessor::default();
        let mut keys = SequentialKeyGenerator::new();

        let report = process(&mut processor, vec![record(1, 1)], &mut keys).unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(processor.inserts, vec![record(1, 1)]);
        assert_eq!(keys.issued(), 0);
    }

    #[test]
    fn test_invalid_dropped() {
        let mut processor = MapProcessor::default();
        let mut bad = record(1, 1);
        bad.group_id.clear();

        let report =
            process(&mut processor, vec![bad], &mut SequentialKeyGenerator::new()).unwrap();

        assert_eq!(report.invalid, 1);
        assert!(processor.rows.is_empty());
    }

    #[test]
    fn test_remote_wins_adopts_remote_key() {
        let mut processor = MapProcessor::default();
        processor.rows.insert(3, record(9, 3));
        let mut remote = record(1, 3);
        remote.blocked = true;

        let report = process(
            &mut processor,
            vec![remote.clone()],
            &mut SequentialKeyGenerator::new(),
        )
        .unwrap();

        assert_eq!(report.remote_wins, 1);
        assert_eq!(processor.updates[0].new, remote);
        assert_eq!(processor.updates[0].old, record(9, 3));
    }

    #[test]
    fn test_local_wins_writes_nothing() {
        let mut processor = MapProcessor::default();
        let mut local = record(9, 3);
        local.archived = true;
        processor.rows.insert(3, local);
        let mut keys = SequentialKeyGenerator::new();

        let report = process(&mut processor, vec![record(1, 3)], &mut keys).unwrap();

        assert_eq!(report.local_wins, 1);
        assert!(processor.updates.is_empty());
        assert_eq!(keys.issued(), 0);
    }

    #[test]
    fn test_synthesized_merge_gets_fresh_key() {
        let mut processor = MapProcessor::default();
        let mut local = record(9, 3);
        local.archived = true;
        processor.rows.insert(3, local);

        let mut remote = record(1, 3);
        remote.blocked = true;
        let mut keys = SequentialKeyGenerator::new();

        let report = process(&mut processor, vec![remote], &mut keys).unwrap();

        assert_eq!(report.merged, 1);
        assert_eq!(keys.issued(), 1);
        let new = &processor.updates[0].new;
        assert!(new.blocked && new.archived);
        assert_ne!(new.id.raw, RawId([1; 16]));
        assert_ne!(new.id.raw, RawId([9; 16]));
        assert_eq!(new.id.kind, RecordType::GroupV1);
    }

    #[test]
    #[traced_test]
    fn test_two_remotes_one_local_accepts_exactly_one() {
        let mut processor = MapProcessor::default();
        processor.rows.insert(3, record(9, 3));
        let mut first = record(1, 3);
        first.blocked = true;
        let second = record(2, 3);

        let report = process(
            &mut processor,
            vec![first.clone(), second],
            &mut SequentialKeyGenerator::new(),
        )
        .unwrap();

        assert_eq!(report.remote_wins, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(processor.rows[&3], first);
        assert!(logs_contain("Multiple remote records map to the same local record"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let processor = MapProcessor::default();
        let mut x = record(4, 4);
        x.archived = true;
        let mut keys = SequentialKeyGenerator::new();
        assert_eq!(processor.merge(&x, &x, &mut keys), x);
        assert_eq!(keys.issued(), 0);
    }

    #[test]
    fn test_resolve_merge_prefers_remote_key_on_tie() {
        let remote = record(1, 5);
        let local = record(2, 5);
        let merged = resolve_merge(record(7, 5), &remote, &local, &mut SequentialKeyGenerator::new());
        assert_eq!(merged.id, remote.id);
    }
}
