//! One full reconciliation pass.
//!
//! The caller supplies the local and remote manifests plus the remote records
//! it fetched; the pass applies local mutations through the [`LocalStore`]
//! and returns the write-back proposal for the remote store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use concord_shared::local::RecipientId;
use concord_shared::{
    AccountRecord, ContactRecord, DistributionId, DistributionListRecord, GroupV1Record,
    GroupV2Record, KeyGenerator, RawId, RecordType, StorageId, StorageRecord, UnknownRecord,
};

use crate::adapters;
use crate::config::SyncConfig;
use crate::diff::find_id_difference;
use crate::error::{Result, SyncError};
use crate::manifest::{Manifest, WriteOperationResult};
use crate::processor::{process, ProcessReport};
use crate::processors::{
    AccountProcessor, ContactProcessor, DistributionListProcessor, GroupV1Processor,
    GroupV2Processor, StoreResultExt,
};
use crate::store::LocalStore;
use crate::validation::validate;

/// A locally edited row whose storage key has to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEntity {
    Account,
    Recipient(RecipientId),
    DistributionList(DistributionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// The manifest the remote store holds once `write` is applied.
    pub manifest: Manifest,
    pub write: Option<WriteOperationResult>,
    pub reports: Vec<ProcessReport>,
    /// Shared keys disagree on type; the primary device should rewrite the
    /// remote store from scratch.
    pub needs_force_push: bool,
}

/// Remote records split by kind, in input order.
#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    pub contacts: Vec<ContactRecord>,
    pub groups_v1: Vec<GroupV1Record>,
    pub groups_v2: Vec<GroupV2Record>,
    pub accounts: Vec<AccountRecord>,
    pub distribution_lists: Vec<DistributionListRecord>,
    pub unknown: Vec<UnknownRecord>,
}

impl RecordCollection {
    pub fn new(records: Vec<StorageRecord>) -> Self {
        let mut collection = Self::default();

        for record in records {
            let id = *record.id();
            let consistent = match record.body_kind() {
                Some(kind) => kind == id.kind,
                None => id.is_unknown(),
            };
            if !consistent {
                warn!(id = %id, body = ?record.body_kind(), "Bad record! Type does not match its id. Dropping it.");
                continue;
            }

            match record {
                StorageRecord::Contact(r) => collection.contacts.push(r),
                StorageRecord::GroupV1(r) => collection.groups_v1.push(r),
                StorageRecord::GroupV2(r) => collection.groups_v2.push(r),
                StorageRecord::Account(r) => collection.accounts.push(r),
                StorageRecord::DistributionList(r) => collection.distribution_lists.push(r),
                StorageRecord::Unknown(r) => collection.unknown.push(r),
            }
        }

        collection
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
            + self.groups_v1.len()
            + self.groups_v2.len()
            + self.accounts.len()
            + self.distribution_lists.len()
            + self.unknown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct StorageSync {
    config: SyncConfig,
}

impl StorageSync {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn reconcile<S: LocalStore>(
        &self,
        store: &mut S,
        keys: &mut dyn KeyGenerator,
        local_manifest: &Manifest,
        remote_manifest: &Manifest,
        remote_records: Vec<StorageRecord>,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome> {
        let self_identity = store.local_account().store_err()?.identity;
        ensure_account_key(store, keys)?;

        let mut reports = Vec::new();
        let mut needs_force_push = false;

        if remote_manifest.version > local_manifest.version {
            info!(
                local = local_manifest.version,
                remote = remote_manifest.version,
                "Newer manifest version found"
            );

            let mut diff = find_id_difference(&remote_manifest.storage_ids, &local_storage_ids(store)?);

            if diff.has_type_mismatches {
                if self.config.is_primary_device {
                    warn!("Found type mismatches in the key sets! Scheduling a force push.");
                    needs_force_push = true;
                } else {
                    warn!("Found type mismatches in the key sets, but not the primary device.");
                }
            }

            if !diff.local_only.is_empty() {
                let cleared = clear_unregistered_keys(store, &diff.local_only)?;
                if cleared > 0 {
                    info!(cleared, "Unregistered local-only contacts will not be uploaded");
                    diff = find_id_difference(&remote_manifest.storage_ids, &local_storage_ids(store)?);
                }
            }

            info!(%diff, "Pre-merge key difference");

            let wanted: HashSet<StorageId> = diff.remote_only.iter().copied().collect();
            let mut received = HashSet::with_capacity(wanted.len());
            let records: Vec<StorageRecord> = remote_records
                .into_iter()
                .filter(|r| {
                    let keep = wanted.contains(r.id());
                    if keep {
                        received.insert(*r.id());
                    } else {
                        debug!(id = %r.id(), "Ignoring record that is not remote-only");
                    }
                    keep
                })
                .collect();

            let missing = wanted.len() - received.len();
            if missing > 0 {
                warn!(missing, "Remote records were requested but not supplied");
            }

            let collection = RecordCollection::new(records);
            info!(records = collection.len(), "Processing remote-only records");

            reports.push(process(
                &mut ContactProcessor::new(&mut *store, self_identity.clone()),
                collection.contacts,
                keys,
            )?);
            reports.push(process(&mut GroupV1Processor::new(&mut *store), collection.groups_v1, keys)?);
            reports.push(process(&mut GroupV2Processor::new(&mut *store), collection.groups_v2, keys)?);
            reports.push(process(&mut AccountProcessor::new(&mut *store), collection.accounts, keys)?);
            reports.push(process(
                &mut DistributionListProcessor::new(&mut *store),
                collection.distribution_lists,
                keys,
            )?);

            if !collection.unknown.is_empty() {
                info!(count = collection.unknown.len(), "Storing unknown records");
                store.insert_unknown_records(&collection.unknown).store_err()?;
            }

            let stale_unknown: Vec<RawId> = diff
                .local_only
                .iter()
                .filter(|id| id.is_unknown())
                .map(|id| id.raw)
                .collect();
            if !stale_unknown.is_empty() {
                info!(count = stale_unknown.len(), "Removing local-only unknown records");
                store.delete_unknown_records(&stale_unknown).store_err()?;
            }
        } else if remote_manifest.version < local_manifest.version {
            warn!(
                local = local_manifest.version,
                remote = remote_manifest.version,
                "Remote manifest is older than the local one"
            );
        } else {
            debug!(version = remote_manifest.version, "Remote manifest is current");
        }

        self.cleanup_unregistered(store, now)?;

        let write = build_write_operation(store, remote_manifest)?;
        let Some(write) = write else {
            info!("No remote changes needed");
            return Ok(SyncOutcome {
                manifest: Manifest::new(remote_manifest.version, local_storage_ids(store)?),
                write: None,
                reports,
                needs_force_push,
            });
        };

        info!(%write, "Proposing write operation");
        validate(&write, Some(remote_manifest), &self_identity)?;

        Ok(SyncOutcome {
            manifest: write.manifest.clone(),
            write: Some(write),
            reports,
            needs_force_push,
        })
    }

    /// Contacts unregistered longer than the retention window lose their
    /// key, which removes them from the remote store on the next write.
    pub fn cleanup_unregistered<S: LocalStore>(&self, store: &mut S, now: DateTime<Utc>) -> Result<usize> {
        let retention_ms = self.config.unregistered_retention.num_milliseconds().max(0);
        let cutoff = now.timestamp_millis().saturating_sub(retention_ms);

        let mut cleared = 0;
        for mut recipient in store.all_recipients().store_err()? {
            let expired = recipient.unregistered_at > 0
                && i64::try_from(recipient.unregistered_at).is_ok_and(|at| at < cutoff);
            if expired && recipient.storage_id.is_some() {
                recipient.storage_id = None;
                store.update_recipient(&recipient).store_err()?;
                cleared += 1;
            }
        }

        if cleared > 0 {
            info!(cleared, "Cleared storage ids of long-unregistered contacts");
        }
        Ok(cleared)
    }

    /// Give a locally edited entity a fresh key. Returns `None` when the
    /// entity has no row or was never synced.
    pub fn rotate_storage_id<S: LocalStore>(
        &self,
        store: &mut S,
        keys: &mut dyn KeyGenerator,
        entity: LocalEntity,
    ) -> Result<Option<RawId>> {
        let raw = keys.generate();

        match entity {
            LocalEntity::Account => {
                let mut account = store.local_account().store_err()?;
                account.storage_id = Some(raw);
                store.update_local_account(&account).store_err()?;
            }
            LocalEntity::Recipient(id) => {
                let Some(mut recipient) = store.recipient(id).store_err()? else {
                    warn!(recipient = %id, "Cannot rotate storage id of missing recipient");
                    return Ok(None);
                };
                if recipient.storage_id.is_none() {
                    return Ok(None);
                }
                recipient.storage_id = Some(raw);
                store.update_recipient(&recipient).store_err()?;
            }
            LocalEntity::DistributionList(id) => {
                let Some(mut list) = store.distribution_list(&id).store_err()? else {
                    warn!(list = %id, "Cannot rotate storage id of missing distribution list");
                    return Ok(None);
                };
                if list.storage_id.is_none() {
                    return Ok(None);
                }
                list.storage_id = Some(raw);
                store.update_distribution_list(&list).store_err()?;
            }
        }

        debug!(?entity, key = %raw, "Rotated storage id");
        Ok(Some(raw))
    }
}

/// Every key the local store currently owns: account, recipients,
/// distribution lists, then unknown records.
pub fn local_storage_ids<S: LocalStore>(store: &S) -> Result<Vec<StorageId>> {
    let mut ids = Vec::new();

    if let Some(raw) = store.local_account().store_err()?.storage_id {
        ids.push(StorageId::for_account(raw));
    }

    for recipient in store.all_recipients().store_err()? {
        if let Some(raw) = recipient.storage_id {
            ids.push(StorageId::new(adapters::recipient_record_type(&recipient), raw));
        }
    }

    for list in store.all_distribution_lists().store_err()? {
        if let Some(raw) = list.storage_id {
            ids.push(StorageId::for_distribution_list(raw));
        }
    }

    for unknown in store.unknown_records().store_err()? {
        ids.push(unknown.id);
    }

    Ok(ids)
}

fn ensure_account_key<S: LocalStore>(store: &mut S, keys: &mut dyn KeyGenerator) -> Result<()> {
    let mut account = store.local_account().store_err()?;
    if account.storage_id.is_none() {
        let raw = keys.generate();
        info!(key = %raw, "No storage id for the local account. Generating one.");
        account.storage_id = Some(raw);
        store.update_local_account(&account).store_err()?;
    }
    Ok(())
}

fn clear_unregistered_keys<S: LocalStore>(store: &mut S, local_only: &[StorageId]) -> Result<usize> {
    let mut cleared = 0;
    for id in local_only.iter().filter(|id| id.kind == RecordType::Contact) {
        let Some(mut recipient) = store.recipient_by_storage_id(&id.raw).store_err()? else {
            continue;
        };
        if recipient.unregistered_at > 0 {
            recipient.storage_id = None;
            store.update_recipient(&recipient).store_err()?;
            cleared += 1;
        }
    }
    Ok(cleared)
}

fn build_write_operation<S: LocalStore>(
    store: &S,
    remote_manifest: &Manifest,
) -> Result<Option<WriteOperationResult>> {
    let local_ids = local_storage_ids(store)?;
    let diff = find_id_difference(&remote_manifest.storage_ids, &local_ids);

    let mut inserts = Vec::with_capacity(diff.local_only.len());
    for id in diff.local_only.iter().filter(|id| !id.is_unknown()) {
        let record = adapters::local_record_for(store, id)
            .store_err()?
            .ok_or(SyncError::MissingLocalRecord(*id))?;
        inserts.push(record);
    }

    let deletes: Vec<RawId> = diff.remote_only.iter().map(|id| id.raw).collect();

    if inserts.is_empty() && deletes.is_empty() {
        return Ok(None);
    }

    let version = remote_manifest
        .version
        .checked_add(1)
        .ok_or(SyncError::ManifestVersionOverflow(remote_manifest.version))?;

    Ok(Some(WriteOperationResult {
        manifest: Manifest::new(version, local_ids),
        inserts,
        deletes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::memory::MemoryStore;
    use chrono::{Duration, TimeZone};
    use concord_shared::groups::GroupIdV1;
    use concord_shared::local::{
        DistributionListRow, LocalAccount, Recipient, RecipientKind, SelfIdentity,
    };
    use concord_shared::{Aci, Pni, SequentialKeyGenerator};
    use uuid::Uuid;

    const ACCOUNT_KEY: RawId = RawId([0xAC; 16]);

    fn me() -> SelfIdentity {
        SelfIdentity {
            aci: Aci(Uuid::from_u128(0xAAAA)),
            pni: Some(Pni(Uuid::from_u128(0xBBBB))),
            e164: Some("+15555550100".into()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn seeded_store() -> MemoryStore {
        let mut account = LocalAccount::new(me());
        account.storage_id = Some(ACCOUNT_KEY);
        let mut store = MemoryStore::new(account);

        let mut my_story = DistributionListRow::new(DistributionId::MY_STORY, "My Story");
        my_story.storage_id = Some(RawId([0x5A; 16]));
        store.insert_distribution_list(&my_story).unwrap();
        store
    }

    fn contact(key: u8, aci: u128) -> ContactRecord {
        ContactRecord {
            aci: Some(Aci(Uuid::from_u128(aci))),
            ..ContactRecord::new(StorageId::for_contact(RawId([key; 16])))
        }
    }

    fn ids(records: &[StorageRecord], extra: &[StorageId]) -> Vec<StorageId> {
        records.iter().map(|r| *r.id()).chain(extra.iter().copied()).collect()
    }

    fn base_ids() -> Vec<StorageId> {
        vec![
            StorageId::for_account(ACCOUNT_KEY),
            StorageId::for_distribution_list(RawId([0x5A; 16])),
        ]
    }

    #[test]
    fn test_new_remote_contact_is_inserted() {
        let mut store = seeded_store();
        let records = vec![StorageRecord::from(contact(1, 7))];
        let remote = Manifest::new(5, ids(&records, &base_ids()));
        let local = Manifest::new(4, base_ids());

        let outcome = StorageSync::default()
            .reconcile(&mut store, &mut SequentialKeyGenerator::new(), &local, &remote, records, now())
            .unwrap();

        assert!(outcome.write.is_none());
        assert_eq!(outcome.manifest.version, 5);
        assert_eq!(outcome.reports[0].inserted, 1);
        assert!(store.recipient_by_aci(&Aci(Uuid::from_u128(7))).unwrap().is_some());
    }

    #[test]
    fn test_synthesized_merge_produces_insert_and_delete() {
        let mut store = seeded_store();
        let mut row = Recipient::contact(Some(Aci(Uuid::from_u128(7))), None, None);
        row.storage_id = Some(RawId([1; 16]));
        row.profile_given_name = "Alice".into();
        store.insert_recipient(&row).unwrap();

        let mut incoming = contact(2, 7);
        incoming.blocked = true;
        let records = vec![StorageRecord::from(incoming)];
        let remote = Manifest::new(5, ids(&records, &base_ids()));
        let local = Manifest::new(4, ids(&[], &base_ids()));

        let mut keys = SequentialKeyGenerator::new();
        let outcome = StorageSync::default()
            .reconcile(&mut store, &mut keys, &local, &remote, records, now())
            .unwrap();

        let write = outcome.write.expect("write operation");
        assert_eq!(write.manifest.version, 6);
        assert_eq!(write.deletes, vec![RawId([2; 16])]);
        assert_eq!(write.inserts.len(), 1);
        let inserted = write.inserts[0].as_contact().unwrap();
        assert_eq!(inserted.profile_given_name, "Alice");
        assert!(inserted.blocked);
        assert_eq!(keys.issued(), 1);
    }

    #[test]
    fn test_reconcile_is_deterministic_and_converges() {
        let mut store = seeded_store();
        let mut row = Recipient::contact(Some(Aci(Uuid::from_u128(3))), None, None);
        row.storage_id = Some(RawId([3; 16]));
        row.system_given_name = "Sys".into();
        store.insert_recipient(&row).unwrap();
        store
            .insert_recipient(&Recipient::new(RecipientKind::GroupV1 {
                group_id: GroupIdV1([9; 16]),
            }))
            .unwrap();

        let mut merged = contact(4, 3);
        merged.archived = true;
        let records = vec![StorageRecord::from(merged), contact(5, 8).into()];
        let remote = Manifest::new(2, ids(&records, &base_ids()));
        let local = Manifest::new(1, base_ids());

        let run = |mut store: MemoryStore| {
            let outcome = StorageSync::default()
                .reconcile(
                    &mut store,
                    &mut SequentialKeyGenerator::new(),
                    &local,
                    &remote,
                    records.clone(),
                    now(),
                )
                .unwrap();
            (outcome, store)
        };

        let (first, first_store) = run(store.clone());
        let (second, second_store) = run(store);
        assert_eq!(first, second);
        assert_eq!(first_store, second_store);

        let mut converged = first_store;
        let outcome = StorageSync::default()
            .reconcile(
                &mut converged,
                &mut SequentialKeyGenerator::new(),
                &first.manifest,
                &first.manifest,
                vec![],
                now(),
            )
            .unwrap();
        assert!(outcome.write.is_none());
    }

    #[test]
    fn test_two_remote_accounts_is_one_account() {
        let mut store = seeded_store();
        let mut second = AccountRecord::new(StorageId::for_account(RawId([0xAD; 16])));
        second.given_name = "Other".into();
        let mut first = AccountRecord::new(StorageId::for_account(RawId([0xAE; 16])));
        first.given_name = "Me".into();
        let records = vec![StorageRecord::from(first), second.into()];
        let remote = Manifest::new(
            3,
            ids(&records, &[StorageId::for_distribution_list(RawId([0x5A; 16]))]),
        );

        let outcome = StorageSync::default()
            .reconcile(
                &mut store,
                &mut SequentialKeyGenerator::new(),
                &Manifest::new(2, base_ids()),
                &remote,
                records,
                now(),
            )
            .unwrap();

        let account_report = &outcome.reports[3];
        assert_eq!(account_report.invalid, 1);
        assert_eq!(account_report.remote_wins, 1);
        assert_eq!(outcome.manifest.account_ids().count(), 1);
        let write = outcome.write.unwrap();
        assert_eq!(write.deletes, vec![RawId([0xAD; 16])]);
        assert_eq!(store.local_account().unwrap().given_name, "Me");
    }

    #[test]
    fn test_type_mismatch_sets_force_push_on_primary() {
        let remote = Manifest::new(
            2,
            vec![
                StorageId::for_account(ACCOUNT_KEY),
                StorageId::for_contact(RawId([0x5A; 16])),
            ],
        );

        let mut store = seeded_store();
        let outcome = StorageSync::default()
            .reconcile(
                &mut store,
                &mut SequentialKeyGenerator::new(),
                &Manifest::new(1, base_ids()),
                &remote,
                vec![],
                now(),
            )
            .unwrap();
        assert!(outcome.needs_force_push);

        let linked = StorageSync::new(SyncConfig {
            is_primary_device: false,
            ..SyncConfig::default()
        });
        let mut store = seeded_store();
        let outcome = linked
            .reconcile(
                &mut store,
                &mut SequentialKeyGenerator::new(),
                &Manifest::new(1, base_ids()),
                &remote,
                vec![],
                now(),
            )
            .unwrap();
        assert!(!outcome.needs_force_push);
    }

    #[test]
    fn test_unknown_records_keep_their_keys() {
        let mut store = seeded_store();
        let unknown_id = StorageId::new(RecordType::Unknown(42), RawId([0x42; 16]));
        let records = vec![StorageRecord::from(UnknownRecord {
            id: unknown_id,
            data: vec![1, 2, 3],
        })];
        let remote = Manifest::new(2, ids(&records, &base_ids()));

        let outcome = StorageSync::default()
            .reconcile(
                &mut store,
                &mut SequentialKeyGenerator::new(),
                &Manifest::new(1, base_ids()),
                &remote,
                records,
                now(),
            )
            .unwrap();

        assert!(outcome.write.is_none());
        assert!(outcome.manifest.storage_ids.contains(&unknown_id));
        assert_eq!(store.unknown_records().unwrap().len(), 1);
    }

    #[test]
    fn test_local_only_unknown_records_removed() {
        let mut store = seeded_store();
        let unknown_id = StorageId::new(RecordType::Unknown(42), RawId([0x42; 16]));
        store
            .insert_unknown_records(&[UnknownRecord {
                id: unknown_id,
                data: vec![],
            }])
            .unwrap();

        let outcome = StorageSync::default()
            .reconcile(
                &mut store,
                &mut SequentialKeyGenerator::new(),
                &Manifest::new(1, base_ids()),
                &Manifest::new(2, base_ids()),
                vec![],
                now(),
            )
            .unwrap();

        assert!(outcome.write.is_none());
        assert!(store.unknown_records().unwrap().is_empty());
    }

    #[test]
    fn test_expired_unregistered_contacts_lose_key() {
        let mut store = seeded_store();
        let mut expired = Recipient::contact(Some(Aci(Uuid::from_u128(1))), None, None);
        expired.storage_id = Some(RawId([1; 16]));
        expired.unregistered_at = (now() - Duration::days(31)).timestamp_millis() as u64;
        store.insert_recipient(&expired).unwrap();
        let mut recent = Recipient::contact(Some(Aci(Uuid::from_u128(2))), None, None);
        recent.storage_id = Some(RawId([2; 16]));
        recent.unregistered_at = (now() - Duration::days(2)).timestamp_millis() as u64;
        store.insert_recipient(&recent).unwrap();

        let cleared = StorageSync::default().cleanup_unregistered(&mut store, now()).unwrap();

        assert_eq!(cleared, 1);
        let ids = local_storage_ids(&store).unwrap();
        assert!(!ids.contains(&StorageId::for_contact(RawId([1; 16]))));
        assert!(ids.contains(&StorageId::for_contact(RawId([2; 16]))));
    }

    #[test]
    fn test_rotate_storage_id_uploads_edit() {
        let mut store = seeded_store();
        let manifest = Manifest::new(3, base_ids());
        let sync = StorageSync::default();
        let mut keys = SequentialKeyGenerator::new();

        let new_key = sync
            .rotate_storage_id(&mut store, &mut keys, LocalEntity::DistributionList(DistributionId::MY_STORY))
            .unwrap()
            .unwrap();

        let outcome = sync
            .reconcile(&mut store, &mut keys, &manifest, &manifest, vec![], now())
            .unwrap();
        let write = outcome.write.unwrap();
        assert_eq!(write.deletes, vec![RawId([0x5A; 16])]);
        assert_eq!(write.inserts.len(), 1);
        assert_eq!(write.inserts[0].id().raw, new_key);
        assert_eq!(write.manifest.version, 4);
    }

    #[test]
    fn test_rotate_missing_entity_is_none() {
        let mut store = seeded_store();
        let rotated = StorageSync::default()
            .rotate_storage_id(
                &mut store,
                &mut SequentialKeyGenerator::new(),
                LocalEntity::Recipient(RecipientId(999)),
            )
            .unwrap();
        assert!(rotated.is_none());
    }

    #[test]
    fn test_bad_records_dropped_from_collection() {
        let mut mislabeled = contact(1, 1);
        mislabeled.id = StorageId::for_group_v1(RawId([1; 16]));
        let collection = RecordCollection::new(vec![mislabeled.into(), contact(2, 2).into()]);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.contacts.len(), 1);
    }

    #[test]
    fn test_self_contact_never_uploaded() {
        // A local contact row carrying our own ACI would be uploaded as a
        // self contact; the validator stops the pass.
        let mut store = seeded_store();
        let mut row = Recipient::contact(Some(me().aci), None, None);
        row.storage_id = Some(RawId([0x77; 16]));
        store.insert_recipient(&row).unwrap();

        let manifest = Manifest::new(1, base_ids());
        let err = StorageSync::default()
            .reconcile(&mut store, &mut SequentialKeyGenerator::new(), &manifest, &manifest, vec![], now())
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Validation(ValidationError::SelfAddedAsContact(_))
        ));
    }

    #[test]
    fn test_two_remote_contacts_for_one_aci_leave_one_key() {
        let mut store = seeded_store();
        let mut row = Recipient::contact(Some(Aci(Uuid::from_u128(7))), None, None);
        row.storage_id = Some(RawId([1; 16]));
        store.insert_recipient(&row).unwrap();

        let mut with_phone = contact(2, 7);
        with_phone.e164 = Some("+15555550123".into());
        let mut blocked = contact(3, 7);
        blocked.blocked = true;
        let records = vec![StorageRecord::from(with_phone), StorageRecord::from(blocked)];
        let remote = Manifest::new(5, ids(&records, &base_ids()));
        let mut local_ids = base_ids();
        local_ids.push(StorageId::for_contact(RawId([1; 16])));
        let local = Manifest::new(4, local_ids);

        let outcome = StorageSync::default()
            .reconcile(&mut store, &mut SequentialKeyGenerator::new(), &local, &remote, records, now())
            .unwrap();

        assert_eq!(outcome.reports[0].remote_wins, 1);
        assert_eq!(outcome.reports[0].duplicates, 1);

        let write = outcome.write.expect("write operation");
        assert!(write.inserts.is_empty());
        assert_eq!(write.deletes, vec![RawId([3; 16])]);

        let contacts: Vec<&StorageId> = write
            .manifest
            .storage_ids
            .iter()
            .filter(|id| id.kind == RecordType::Contact)
            .collect();
        assert_eq!(contacts, vec![&StorageId::for_contact(RawId([2; 16]))]);
        assert!(!store.recipient_by_aci(&Aci(Uuid::from_u128(7))).unwrap().unwrap().blocked);
    }

    #[test]
    fn test_manifest_version_overflow_is_an_error() {
        let mut store = seeded_store();
        let mut row = Recipient::contact(Some(Aci(Uuid::from_u128(7))), None, None);
        row.storage_id = Some(RawId([1; 16]));
        store.insert_recipient(&row).unwrap();

        let manifest = Manifest::new(u64::MAX, base_ids());
        let err = StorageSync::default()
            .reconcile(&mut store, &mut SequentialKeyGenerator::new(), &manifest, &manifest, vec![], now())
            .unwrap_err();
        assert!(matches!(err, SyncError::ManifestVersionOverflow(u64::MAX)));
    }
}
