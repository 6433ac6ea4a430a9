use tracing::{info, warn};

use concord_shared::groups::GroupIdV1;
use concord_shared::{GroupV1Record, KeyGenerator, RecordType};

use super::{ensure_recipient_key, StoreResultExt};
use crate::adapters;
use crate::error::{Result, SyncError};
use crate::processor::{resolve_merge, RecordProcessor, RecordUpdate};
use crate::store::LocalStore;

pub struct GroupV1Processor<'a, S: LocalStore> {
    store: &'a mut S,
}

impl<'a, S: LocalStore> GroupV1Processor<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }
}

impl<S: LocalStore> RecordProcessor for GroupV1Processor<'_, S> {
    type Record = GroupV1Record;
    type Identity = Vec<u8>;

    fn kind(&self) -> RecordType {
        RecordType::GroupV1
    }

    /// Bad ids are invalid, as are groups that already live on as a
    /// migrated V2 group.
    fn is_invalid(&mut self, remote: &GroupV1Record) -> Result<bool> {
        let Ok(group_id) = GroupIdV1::from_slice(&remote.group_id) else {
            warn!(id = %remote.id, len = remote.group_id.len(), "Bad group V1 id");
            return Ok(true);
        };

        let migrated = self
            .store
            .recipient_by_group_v2(&group_id.expected_v2_id())
            .store_err()?;
        if migrated.is_some() {
            warn!(id = %remote.id, group = %group_id, "Group V1 was already migrated to V2");
            return Ok(true);
        }

        Ok(false)
    }

    fn find_local_match(
        &mut self,
        remote: &GroupV1Record,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Option<GroupV1Record>> {
        let group_id = GroupIdV1::from_slice(&remote.group_id)?;
        let Some(recipient) = self.store.recipient_by_group_v1(&group_id).store_err()? else {
            return Ok(None);
        };

        let recipient = ensure_recipient_key(&mut *self.store, recipient, keys)?;
        Ok(adapters::group_v1_record(&recipient))
    }

    fn merge(
        &self,
        remote: &GroupV1Record,
        local: &GroupV1Record,
        keys: &mut dyn KeyGenerator,
    ) -> GroupV1Record {
        let merged = GroupV1Record {
            id: remote.id,
            group_id: local.group_id.clone(),
            blocked: remote.blocked,
            profile_sharing: remote.profile_sharing,
            archived: remote.archived,
            forced_unread: remote.forced_unread,
            mute_until: remote.mute_until,
            unknown_fields: remote.unknown_fields.clone(),
        };

        resolve_merge(merged, remote, local, keys)
    }

    fn insert_local(&mut self, record: GroupV1Record) -> Result<()> {
        let recipient = adapters::recipient_from_group_v1(&record)?;
        let id = self.store.insert_recipient(&recipient).store_err()?;
        info!(recipient = %id, key = %record.id, "Inserted group V1");
        Ok(())
    }

    fn update_local(&mut self, update: RecordUpdate<GroupV1Record>) -> Result<()> {
        let mut recipient = self
            .store
            .recipient_by_storage_id(&update.old.id.raw)
            .store_err()?
            .ok_or(SyncError::MissingLocalRecord(update.old.id))?;

        adapters::apply_group_v1(&mut recipient, &update.new)?;
        self.store.update_recipient(&recipient).store_err()
    }

    fn identity(&self, record: &GroupV1Record) -> Vec<u8> {
        record.group_id.clone()
    }
}
