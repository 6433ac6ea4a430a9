use tracing::{info, warn};

use concord_shared::text::is_visually_empty;
use concord_shared::{DistributionId, DistributionListRecord, KeyGenerator, RecordType};

use super::StoreResultExt;
use crate::adapters;
use crate::error::{Result, SyncError};
use crate::processor::{resolve_merge, RecordProcessor, RecordUpdate};
use crate::store::LocalStore;

pub struct DistributionListProcessor<'a, S: LocalStore> {
    store: &'a mut S,
    seen_my_story: bool,
}

impl<'a, S: LocalStore> DistributionListProcessor<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            seen_my_story: false,
        }
    }
}

impl<S: LocalStore> RecordProcessor for DistributionListProcessor<'_, S> {
    type Record = DistributionListRecord;
    type Identity = Vec<u8>;

    fn kind(&self) -> RecordType {
        RecordType::DistributionList
    }

    fn is_invalid(&mut self, remote: &DistributionListRecord) -> Result<bool> {
        let Ok(distribution_id) = DistributionId::from_slice(&remote.identifier) else {
            warn!(id = %remote.id, "Bad distribution list identifier");
            return Ok(true);
        };

        if distribution_id.is_my_story() {
            if self.seen_my_story {
                warn!(id = %remote.id, "Found an additional My Story record! Ignoring it.");
                return Ok(true);
            }
            self.seen_my_story = true;

            if remote.deleted_at > 0 {
                warn!(id = %remote.id, "Refusing to delete My Story");
                return Ok(true);
            }
        }

        if remote.deleted_at == 0 && is_visually_empty(&remote.name) {
            warn!(id = %remote.id, "Distribution list has a visually empty name");
            return Ok(true);
        }

        Ok(false)
    }

    fn find_local_match(
        &mut self,
        remote: &DistributionListRecord,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Option<DistributionListRecord>> {
        let distribution_id = DistributionId::from_slice(&remote.identifier)?;

        let Some(mut list) = self.store.distribution_list(&distribution_id).store_err()? else {
            if distribution_id.is_my_story() {
                return Err(SyncError::MissingMyStory);
            }
            return Ok(None);
        };

        if list.storage_id.is_none() {
            list.storage_id = Some(keys.generate());
            self.store.update_distribution_list(&list).store_err()?;
        }
        Ok(adapters::distribution_list_record(&list))
    }

    fn merge(
        &self,
        remote: &DistributionListRecord,
        local: &DistributionListRecord,
        keys: &mut dyn KeyGenerator,
    ) -> DistributionListRecord {
        let merged = DistributionListRecord {
            id: remote.id,
            identifier: local.identifier.clone(),
            name: remote.name.clone(),
            recipients: remote.recipients.clone(),
            deleted_at: remote.deleted_at,
            allows_replies: remote.allows_replies,
            is_block_list: remote.is_block_list,
            unknown_fields: remote.unknown_fields.clone(),
        };

        resolve_merge(merged, remote, local, keys)
    }

    fn insert_local(&mut self, record: DistributionListRecord) -> Result<()> {
        let list = adapters::distribution_list_from_record(&record)?;
        let id = self.store.insert_distribution_list(&list).store_err()?;
        info!(list = id, key = %record.id, "Inserted distribution list");
        Ok(())
    }

    fn update_local(&mut self, update: RecordUpdate<DistributionListRecord>) -> Result<()> {
        let mut list = self
            .store
            .distribution_list_by_storage_id(&update.old.id.raw)
            .store_err()?
            .ok_or(SyncError::MissingLocalRecord(update.old.id))?;

        adapters::apply_distribution_list(&mut list, &update.new);
        self.store.update_distribution_list(&list).store_err()
    }

    fn identity(&self, record: &DistributionListRecord) -> Vec<u8> {
        record.identifier.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::processor::process;
    use concord_shared::local::{DistributionListRow, LocalAccount, SelfIdentity};
    use concord_shared::{Aci, RawId, SequentialKeyGenerator, StorageId};
    use uuid::Uuid;

    fn store() -> MemoryStore {
        MemoryStore::new(LocalAccount::new(SelfIdentity {
            aci: Aci(Uuid::from_u128(1)),
            pni: None,
            e164: None,
        }))
    }

    fn my_story(key: u8) -> DistributionListRecord {
        let mut record = DistributionListRecord::new(
            StorageId::for_distribution_list(RawId([key; 16])),
            DistributionId::MY_STORY.to_bytes(),
        );
        record.name = "My Story".into();
        record
    }

    fn list(key: u8, uuid: u128, name: &str) -> DistributionListRecord {
        let mut record = DistributionListRecord::new(
            StorageId::for_distribution_list(RawId([key; 16])),
            Uuid::from_u128(uuid).as_bytes().to_vec(),
        );
        record.name = name.into();
        record
    }

    #[test]
    fn test_deleted_my_story_is_invalid() {
        let mut store = store();
        let mut row = DistributionListRow::new(DistributionId::MY_STORY, "My Story");
        row.storage_id = Some(RawId([1; 16]));
        store.insert_distribution_list(&row).unwrap();

        let mut record = my_story(2);
        record.deleted_at = 1_700_000_000_000;

        let report = {
            let mut processor = DistributionListProcessor::new(&mut store);
            process(&mut processor, vec![record], &mut SequentialKeyGenerator::new()).unwrap()
        };

        assert_eq!(report.invalid, 1);
        let local = store.distribution_list(&DistributionId::MY_STORY).unwrap().unwrap();
        assert!(!local.is_deleted());
        assert_eq!(local.storage_id, Some(RawId([1; 16])));
    }

    #[test]
    fn test_second_my_story_is_invalid() {
        let mut store = store();
        let mut processor = DistributionListProcessor::new(&mut store);
        assert!(!processor.is_invalid(&my_story(1)).unwrap());
        assert!(processor.is_invalid(&my_story(2)).unwrap());
    }

    #[test]
    fn test_name_and_identifier_rules() {
        let mut store = store();
        let mut processor = DistributionListProcessor::new(&mut store);

        assert!(processor.is_invalid(&list(1, 5, " \u{200B} ")).unwrap());
        assert!(!processor.is_invalid(&list(1, 5, "Friends")).unwrap());

        let mut deleted = list(1, 5, "");
        deleted.deleted_at = 10;
        assert!(!processor.is_invalid(&deleted).unwrap());

        let mut bad = list(1, 5, "Friends");
        bad.identifier = vec![1, 2, 3];
        assert!(processor.is_invalid(&bad).unwrap());
    }

    #[test]
    fn test_missing_my_story_is_fatal() {
        let mut store = store();
        let mut processor = DistributionListProcessor::new(&mut store);
        let err = process(&mut processor, vec![my_story(1)], &mut SequentialKeyGenerator::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::MissingMyStory));
    }

    #[test]
    fn test_remote_wins_updates_members() {
        let mut store = store();
        let mut row = DistributionListRow::new(DistributionId(Uuid::from_u128(5)), "Old");
        row.storage_id = Some(RawId([1; 16]));
        store.insert_distribution_list(&row).unwrap();

        let mut incoming = list(2, 5, "Friends");
        incoming.recipients = vec![Aci(Uuid::from_u128(9))];

        let report = {
            let mut processor = DistributionListProcessor::new(&mut store);
            process(&mut processor, vec![incoming], &mut SequentialKeyGenerator::new()).unwrap()
        };

        assert_eq!(report.remote_wins, 1);
        let local = store
            .distribution_list(&DistributionId(Uuid::from_u128(5)))
            .unwrap()
            .unwrap();
        assert_eq!(local.name, "Friends");
        assert_eq!(local.members, vec![Aci(Uuid::from_u128(9))]);
        assert_eq!(local.storage_id, Some(RawId([2; 16])));
    }
}
