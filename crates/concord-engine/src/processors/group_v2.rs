use tracing::{info, warn};

use concord_shared::groups::GroupMasterKey;
use concord_shared::{GroupV2Record, KeyGenerator, RecordType};

use super::{ensure_recipient_key, StoreResultExt};
use crate::adapters;
use crate::error::{Result, SyncError};
use crate::processor::{resolve_merge, RecordProcessor, RecordUpdate};
use crate::store::LocalStore;

pub struct GroupV2Processor<'a, S: LocalStore> {
    store: &'a mut S,
}

impl<'a, S: LocalStore> GroupV2Processor<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }
}

impl<S: LocalStore> RecordProcessor for GroupV2Processor<'_, S> {
    type Record = GroupV2Record;
    type Identity = Vec<u8>;

    fn kind(&self) -> RecordType {
        RecordType::GroupV2
    }

    fn is_invalid(&mut self, remote: &GroupV2Record) -> Result<bool> {
        if GroupMasterKey::from_slice(&remote.master_key).is_err() {
            warn!(id = %remote.id, len = remote.master_key.len(), "Bad group master key");
            return Ok(true);
        }
        Ok(false)
    }

    fn find_local_match(
        &mut self,
        remote: &GroupV2Record,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Option<GroupV2Record>> {
        let group_id = GroupMasterKey::from_slice(&remote.master_key)?.group_id();
        let Some(recipient) = self.store.recipient_by_group_v2(&group_id).store_err()? else {
            return Ok(None);
        };

        let recipient = ensure_recipient_key(&mut *self.store, recipient, keys)?;
        Ok(adapters::group_v2_record(&recipient))
    }

    fn merge(
        &self,
        remote: &GroupV2Record,
        local: &GroupV2Record,
        keys: &mut dyn KeyGenerator,
    ) -> GroupV2Record {
        let merged = GroupV2Record {
            id: remote.id,
            master_key: local.master_key.clone(),
            blocked: remote.blocked,
            profile_sharing: remote.profile_sharing,
            archived: remote.archived,
            forced_unread: remote.forced_unread,
            mute_until: remote.mute_until,
            dont_notify_for_mentions_if_muted: remote.dont_notify_for_mentions_if_muted,
            hide_story: remote.hide_story,
            story_send_mode: remote.story_send_mode,
            unknown_fields: remote.unknown_fields.clone(),
        };

        resolve_merge(merged, remote, local, keys)
    }

    /// A V2 group we have never seen may be a V1 group we already have,
    /// migrated on another device. That row is converted in place.
    fn insert_local(&mut self, record: GroupV2Record) -> Result<()> {
        let group_id = GroupMasterKey::from_slice(&record.master_key)?.group_id();

        if let Some(mut v1) = self.store.recipient_by_expected_v2(&group_id).store_err()? {
            info!(
                recipient = %v1.id,
                group = %group_id,
                "Discovered a new GV2 ID that is actually a migrated V1 group! Migrating now."
            );
            adapters::apply_group_v2(&mut v1, &record)?;
            return self.store.update_recipient(&v1).store_err();
        }

        let recipient = adapters::recipient_from_group_v2(&record)?;
        let id = self.store.insert_recipient(&recipient).store_err()?;
        info!(recipient = %id, key = %record.id, "Inserted group V2");
        Ok(())
    }

    fn update_local(&mut self, update: RecordUpdate<GroupV2Record>) -> Result<()> {
        let mut recipient = self
            .store
            .recipient_by_storage_id(&update.old.id.raw)
            .store_err()?
            .ok_or(SyncError::MissingLocalRecord(update.old.id))?;

        adapters::apply_group_v2(&mut recipient, &update.new)?;
        self.store.update_recipient(&recipient).store_err()
    }

    fn identity(&self, record: &GroupV2Record) -> Vec<u8> {
        record.master_key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::processor::process;
    use concord_shared::groups::GroupIdV1;
    use concord_shared::local::{LocalAccount, Recipient, RecipientKind, SelfIdentity};
    use concord_shared::{Aci, RawId, SequentialKeyGenerator, StorageId, StorySendMode};
    use uuid::Uuid;

    fn store() -> MemoryStore {
        MemoryStore::new(LocalAccount::new(SelfIdentity {
            aci: Aci(Uuid::from_u128(1)),
            pni: None,
            e164: None,
        }))
    }

    #[test]
    fn test_master_key_length() {
        let mut store = store();
        let mut processor = GroupV2Processor::new(&mut store);
        let id = StorageId::for_group_v2(RawId([1; 16]));
        assert!(processor.is_invalid(&GroupV2Record::new(id, vec![0; 16])).unwrap());
        assert!(!processor.is_invalid(&GroupV2Record::new(id, vec![0; 32])).unwrap());
    }

    #[test]
    fn test_new_v2_migrates_matching_v1() {
        let mut store = store();
        let v1 = GroupIdV1([8; 16]);
        let mut row = Recipient::new(RecipientKind::GroupV1 { group_id: v1 });
        row.storage_id = Some(RawId([0x11; 16]));
        let row_id = store.insert_recipient(&row).unwrap();

        let mut record = GroupV2Record::new(
            StorageId::for_group_v2(RawId([0x22; 16])),
            v1.migration_master_key().0.to_vec(),
        );
        record.story_send_mode = StorySendMode::Enabled;

        let report = {
            let mut processor = GroupV2Processor::new(&mut store);
            process(&mut processor, vec![record], &mut SequentialKeyGenerator::new()).unwrap()
        };

        assert_eq!(report.inserted, 1);
        let recipients = store.all_recipients().unwrap();
        assert_eq!(recipients.len(), 1);
        let migrated = &recipients[0];
        assert_eq!(migrated.id, row_id);
        assert_eq!(migrated.group_v2_id(), Some(v1.expected_v2_id()));
        assert_eq!(migrated.storage_id, Some(RawId([0x22; 16])));
        assert_eq!(migrated.story_send_mode, StorySendMode::Enabled);
        assert!(store.recipient_by_group_v1(&v1).unwrap().is_none());
    }

    #[test]
    fn test_unrelated_v2_inserts() {
        let mut store = store();
        let record = GroupV2Record::new(StorageId::for_group_v2(RawId([1; 16])), vec![7; 32]);
        {
            let mut processor = GroupV2Processor::new(&mut store);
            processor.insert_local(record).unwrap();
        }
        let key = GroupMasterKey([7; 32]);
        assert!(store.recipient_by_group_v2(&key.group_id()).unwrap().is_some());
    }

    #[test]
    fn test_merge_idempotent() {
        let mut store = store();
        let processor = GroupV2Processor::new(&mut store);
        let mut x = GroupV2Record::new(StorageId::for_group_v2(RawId([1; 16])), vec![7; 32]);
        x.hide_story = true;
        x.unknown_fields = vec![5];
        let mut keys = SequentialKeyGenerator::new();
        assert_eq!(processor.merge(&x, &x, &mut keys), x);
        assert_eq!(keys.issued(), 0);
    }
}
