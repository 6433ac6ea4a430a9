//! Mapping between local rows and remote storage records.
//!
//! `*_record` functions project a row onto its record and return `None` when
//! the row has never been given a storage key. `apply_*` functions overwrite
//! a row's synced fields with a record's values, key included.

use concord_shared::groups::{GroupIdV1, GroupMasterKey};
use concord_shared::local::{DistributionListRow, LocalAccount, Recipient, RecipientKind};
use concord_shared::{
    AccountRecord, ContactRecord, DistributionId, DistributionListRecord, GroupV1Record,
    GroupV2Record, IdError, RecordType, StorageId, StorageRecord,
};

use crate::store::LocalStore;

// ---------------------------------------------------------------------------
// Local -> remote
// ---------------------------------------------------------------------------

pub fn contact_record(recipient: &Recipient) -> Option<ContactRecord> {
    let RecipientKind::Contact { aci, pni, e164 } = &recipient.kind else {
        return None;
    };
    let raw = recipient.storage_id?;

    Some(ContactRecord {
        id: StorageId::for_contact(raw),
        aci: *aci,
        pni: *pni,
        e164: e164.clone(),
        profile_given_name: recipient.profile_given_name.clone(),
        profile_family_name: recipient.profile_family_name.clone(),
        system_given_name: recipient.system_given_name.clone(),
        system_family_name: recipient.system_family_name.clone(),
        profile_key: recipient.profile_key.clone(),
        username: recipient.username.clone(),
        identity_state: recipient.identity_state,
        identity_key: recipient.identity_key.clone(),
        blocked: recipient.blocked,
        profile_sharing: recipient.profile_sharing,
        archived: recipient.archived,
        forced_unread: recipient.forced_unread,
        hidden: recipient.hidden,
        hide_story: recipient.hide_story,
        mute_until: recipient.mute_until,
        unregistered_at: recipient.unregistered_at,
        unknown_fields: recipient.unknown_fields.clone(),
    })
}

pub fn group_v1_record(recipient: &Recipient) -> Option<GroupV1Record> {
    let RecipientKind::GroupV1 { group_id } = &recipient.kind else {
        return None;
    };
    let raw = recipient.storage_id?;

    Some(GroupV1Record {
        id: StorageId::for_group_v1(raw),
        group_id: group_id.0.to_vec(),
        blocked: recipient.blocked,
        profile_sharing: recipient.profile_sharing,
        archived: recipient.archived,
        forced_unread: recipient.forced_unread,
        mute_until: recipient.mute_until,
        unknown_fields: recipient.unknown_fields.clone(),
    })
}

pub fn group_v2_record(recipient: &Recipient) -> Option<GroupV2Record> {
    let RecipientKind::GroupV2 { master_key } = &recipient.kind else {
        return None;
    };
    let raw = recipient.storage_id?;

    Some(GroupV2Record {
        id: StorageId::for_group_v2(raw),
        master_key: master_key.0.to_vec(),
        blocked: recipient.blocked,
        profile_sharing: recipient.profile_sharing,
        archived: recipient.archived,
        forced_unread: recipient.forced_unread,
        mute_until: recipient.mute_until,
        dont_notify_for_mentions_if_muted: recipient.dont_notify_for_mentions_if_muted,
        hide_story: recipient.hide_story,
        story_send_mode: recipient.story_send_mode,
        unknown_fields: recipient.unknown_fields.clone(),
    })
}

pub fn recipient_record(recipient: &Recipient) -> Option<StorageRecord> {
    match recipient.kind {
        RecipientKind::Contact { .. } => contact_record(recipient).map(StorageRecord::from),
        RecipientKind::GroupV1 { .. } => group_v1_record(recipient).map(StorageRecord::from),
        RecipientKind::GroupV2 { .. } => group_v2_record(recipient).map(StorageRecord::from),
    }
}

/// The record type a recipient row syncs as.
pub fn recipient_record_type(recipient: &Recipient) -> RecordType {
    match recipient.kind {
        RecipientKind::Contact { .. } => RecordType::Contact,
        RecipientKind::GroupV1 { .. } => RecordType::GroupV1,
        RecipientKind::GroupV2 { .. } => RecordType::GroupV2,
    }
}

pub fn account_record(account: &LocalAccount) -> Option<AccountRecord> {
    let raw = account.storage_id?;

    Some(AccountRecord {
        id: StorageId::for_account(raw),
        given_name: account.given_name.clone(),
        family_name: account.family_name.clone(),
        avatar_url_path: account.avatar_url_path.clone(),
        profile_key: account.profile_key.clone(),
        settings: account.settings.clone(),
        unknown_fields: account.unknown_fields.clone(),
    })
}

pub fn distribution_list_record(list: &DistributionListRow) -> Option<DistributionListRecord> {
    let raw = list.storage_id?;

    Some(DistributionListRecord {
        id: StorageId::for_distribution_list(raw),
        identifier: list.distribution_id.to_bytes(),
        name: list.name.clone(),
        recipients: list.members.clone(),
        deleted_at: list.deleted_at,
        allows_replies: list.allows_replies,
        is_block_list: list.is_block_list,
        unknown_fields: list.unknown_fields.clone(),
    })
}

/// Resolve any local key to the record it currently projects.
pub fn local_record_for<S: LocalStore>(
    store: &S,
    id: &StorageId,
) -> Result<Option<StorageRecord>, S::Error> {
    let record = match id.kind {
        RecordType::Contact | RecordType::GroupV1 | RecordType::GroupV2 => store
            .recipient_by_storage_id(&id.raw)?
            .and_then(|r| recipient_record(&r)),
        RecordType::Account => {
            let account = store.local_account()?;
            if account.storage_id == Some(id.raw) {
                account_record(&account).map(StorageRecord::from)
            } else {
                None
            }
        }
        RecordType::DistributionList => store
            .distribution_list_by_storage_id(&id.raw)?
            .and_then(|l| distribution_list_record(&l))
            .map(StorageRecord::from),
        RecordType::Unknown(_) => store
            .unknown_records()?
            .into_iter()
            .find(|u| u.id.raw == id.raw)
            .map(StorageRecord::from),
    };

    Ok(record.filter(|r| r.id() == id))
}

// ---------------------------------------------------------------------------
// Remote -> local
// ---------------------------------------------------------------------------

pub fn recipient_from_contact(record: &ContactRecord) -> Recipient {
    let mut recipient = Recipient::contact(record.aci, record.pni, record.e164.clone());
    apply_contact(&mut recipient, record);
    recipient
}

pub fn apply_contact(recipient: &mut Recipient, record: &ContactRecord) {
    recipient.storage_id = Some(record.id.raw);
    recipient.kind = RecipientKind::Contact {
        aci: record.aci,
        pni: record.pni,
        e164: record.e164.clone(),
    };
    recipient.profile_given_name = record.profile_given_name.clone();
    recipient.profile_family_name = record.profile_family_name.clone();
    recipient.system_given_name = record.system_given_name.clone();
    recipient.system_family_name = record.system_family_name.clone();
    recipient.profile_key = record.profile_key.clone();
    recipient.username = record.username.clone();
    recipient.identity_state = record.identity_state;
    recipient.identity_key = record.identity_key.clone();
    recipient.blocked = record.blocked;
    recipient.profile_sharing = record.profile_sharing;
    recipient.archived = record.archived;
    recipient.forced_unread = record.forced_unread;
    recipient.hidden = record.hidden;
    recipient.hide_story = record.hide_story;
    recipient.mute_until = record.mute_until;
    recipient.unregistered_at = record.unregistered_at;
    recipient.unknown_fields = record.unknown_fields.clone();
}

pub fn recipient_from_group_v1(record: &GroupV1Record) -> Result<Recipient, IdError> {
    let group_id = GroupIdV1::from_slice(&record.group_id)?;
    let mut recipient = Recipient::new(RecipientKind::GroupV1 { group_id });
    apply_group_v1(&mut recipient, record)?;
    Ok(recipient)
}

pub fn apply_group_v1(recipient: &mut Recipient, record: &GroupV1Record) -> Result<(), IdError> {
    let group_id = GroupIdV1::from_slice(&record.group_id)?;
    recipient.kind = RecipientKind::GroupV1 { group_id };
    recipient.storage_id = Some(record.id.raw);
    recipient.blocked = record.blocked;
    recipient.profile_sharing = record.profile_sharing;
    recipient.archived = record.archived;
    recipient.forced_unread = record.forced_unread;
    recipient.mute_until = record.mute_until;
    recipient.unknown_fields = record.unknown_fields.clone();
    Ok(())
}

pub fn recipient_from_group_v2(record: &GroupV2Record) -> Result<Recipient, IdError> {
    let master_key = GroupMasterKey::from_slice(&record.master_key)?;
    let mut recipient = Recipient::new(RecipientKind::GroupV2 { master_key });
    apply_group_v2(&mut recipient, record)?;
    Ok(recipient)
}

/// Also used to migrate a V1 row in place: the row's kind becomes V2.
pub fn apply_group_v2(recipient: &mut Recipient, record: &GroupV2Record) -> Result<(), IdError> {
    let master_key = GroupMasterKey::from_slice(&record.master_key)?;
    recipient.kind = RecipientKind::GroupV2 { master_key };
    recipient.storage_id = Some(record.id.raw);
    recipient.blocked = record.blocked;
    recipient.profile_sharing = record.profile_sharing;
    recipient.archived = record.archived;
    recipient.forced_unread = record.forced_unread;
    recipient.mute_until = record.mute_until;
    recipient.dont_notify_for_mentions_if_muted = record.dont_notify_for_mentions_if_muted;
    recipient.hide_story = record.hide_story;
    recipient.story_send_mode = record.story_send_mode;
    recipient.unknown_fields = record.unknown_fields.clone();
    Ok(())
}

pub fn apply_account(account: &mut LocalAccount, record: &AccountRecord) {
    account.storage_id = Some(record.id.raw);
    account.given_name = record.given_name.clone();
    account.family_name = record.family_name.clone();
    account.avatar_url_path = record.avatar_url_path.clone();
    account.profile_key = record.profile_key.clone();
    account.settings = record.settings.clone();
    account.unknown_fields = record.unknown_fields.clone();
}

pub fn distribution_list_from_record(
    record: &DistributionListRecord,
) -> Result<DistributionListRow, IdError> {
    let distribution_id = DistributionId::from_slice(&record.identifier)?;
    let mut list = DistributionListRow::new(distribution_id, String::new());
    apply_distribution_list(&mut list, record);
    Ok(list)
}

pub fn apply_distribution_list(list: &mut DistributionListRow, record: &DistributionListRecord) {
    list.storage_id = Some(record.id.raw);
    list.name = record.name.clone();
    list.members = record.recipients.clone();
    list.deleted_at = record.deleted_at;
    list.allows_replies = record.allows_replies;
    list.is_block_list = record.is_block_list;
    list.unknown_fields = record.unknown_fields.clone();
}
