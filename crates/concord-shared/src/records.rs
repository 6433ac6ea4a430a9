//! Typed storage records, as decoded from the remote store.
//!
//! Every record carries `unknown_fields`: the serialized bytes of fields this
//! version does not understand. They are copied from whichever side wins a
//! merge and never synthesized.

use serde::{Deserialize, Serialize};

use crate::ids::{Aci, Pni, RecordType, StorageId};

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityState {
    #[default]
    Default,
    Verified,
    Unverified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorySendMode {
    #[default]
    Default,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhoneNumberSharingMode {
    #[default]
    Unknown,
    Everybody,
    Nobody,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinnedConversation {
    Contact { aci: Option<Aci>, e164: Option<String> },
    GroupV1 { group_id: Vec<u8> },
    GroupV2 { master_key: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payments {
    pub enabled: bool,
    pub entropy: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Vec<u8>,
    pub currency_code: String,
}

/// Per-account settings shared by the remote record and the local account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub note_to_self_archived: bool,
    pub note_to_self_forced_unread: bool,
    pub read_receipts: bool,
    pub typing_indicators: bool,
    pub sealed_sender_indicators: bool,
    pub link_previews: bool,
    pub phone_number_sharing: PhoneNumberSharingMode,
    pub unlisted_phone_number: bool,
    pub prefer_contact_avatars: bool,
    pub pinned_conversations: Vec<PinnedConversation>,
    pub payments: Payments,
    pub default_reactions: Vec<String>,
    pub subscriber: Option<Subscriber>,
    pub universal_expire_timer: u32,
    pub has_set_my_stories_privacy: bool,
    pub has_viewed_onboarding_story: bool,
    pub stories_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: StorageId,
    pub given_name: String,
    pub family_name: String,
    pub avatar_url_path: String,
    pub profile_key: Option<Vec<u8>>,
    pub settings: AccountSettings,
    pub unknown_fields: Vec<u8>,
}

impl AccountRecord {
    pub fn new(id: StorageId) -> Self {
        Self {
            id,
            given_name: String::new(),
            family_name: String::new(),
            avatar_url_path: String::new(),
            profile_key: None,
            settings: AccountSettings::default(),
            unknown_fields: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: StorageId,
    pub aci: Option<Aci>,
    pub pni: Option<Pni>,
    pub e164: Option<String>,
    pub profile_given_name: String,
    pub profile_family_name: String,
    pub system_given_name: String,
    pub system_family_name: String,
    pub profile_key: Option<Vec<u8>>,
    pub username: String,
    pub identity_state: IdentityState,
    pub identity_key: Option<Vec<u8>>,
    pub blocked: bool,
    pub profile_sharing: bool,
    pub archived: bool,
    pub forced_unread: bool,
    pub hidden: bool,
    pub hide_story: bool,
    /// Milliseconds since the epoch; 0 when not muted.
    pub mute_until: u64,
    /// Milliseconds since the epoch; 0 when registered.
    pub unregistered_at: u64,
    pub unknown_fields: Vec<u8>,
}

impl ContactRecord {
    pub fn new(id: StorageId) -> Self {
        Self {
            id,
            aci: None,
            pni: None,
            e164: None,
            profile_given_name: String::new(),
            profile_family_name: String::new(),
            system_given_name: String::new(),
            system_family_name: String::new(),
            profile_key: None,
            username: String::new(),
            identity_state: IdentityState::Default,
            identity_key: None,
            blocked: false,
            profile_sharing: false,
            archived: false,
            forced_unread: false,
            hidden: false,
            hide_story: false,
            mute_until: 0,
            unregistered_at: 0,
            unknown_fields: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupV1Record {
    pub id: StorageId,
    pub group_id: Vec<u8>,
    pub blocked: bool,
    pub profile_sharing: bool,
    pub archived: bool,
    pub forced_unread: bool,
    pub mute_until: u64,
    pub unknown_fields: Vec<u8>,
}

impl GroupV1Record {
    pub fn new(id: StorageId, group_id: Vec<u8>) -> Self {
        Self {
            id,
            group_id,
            blocked: false,
            profile_sharing: false,
            archived: false,
            forced_unread: false,
            mute_until: 0,
            unknown_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupV2Record {
    pub id: StorageId,
    pub master_key: Vec<u8>,
    pub blocked: bool,
    pub profile_sharing: bool,
    pub archived: bool,
    pub forced_unread: bool,
    pub mute_until: u64,
    pub dont_notify_for_mentions_if_muted: bool,
    pub hide_story: bool,
    pub story_send_mode: StorySendMode,
    pub unknown_fields: Vec<u8>,
}

impl GroupV2Record {
    pub fn new(id: StorageId, master_key: Vec<u8>) -> Self {
        Self {
            id,
            master_key,
            blocked: false,
            profile_sharing: false,
            archived: false,
            forced_unread: false,
            mute_until: 0,
            dont_notify_for_mentions_if_muted: false,
            hide_story: false,
            story_send_mode: StorySendMode::Default,
            unknown_fields: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Distribution list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionListRecord {
    pub id: StorageId,
    pub identifier: Vec<u8>,
    pub name: String,
    pub recipients: Vec<Aci>,
    /// Milliseconds since the epoch; non-zero marks a tombstone.
    pub deleted_at: u64,
    pub allows_replies: bool,
    pub is_block_list: bool,
    pub unknown_fields: Vec<u8>,
}

impl DistributionListRecord {
    pub fn new(id: StorageId, identifier: Vec<u8>) -> Self {
        Self {
            id,
            identifier,
            name: String::new(),
            recipients: Vec::new(),
            deleted_at: 0,
            allows_replies: false,
            is_block_list: false,
            unknown_fields: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Unknown
// ---------------------------------------------------------------------------

/// A record whose type this device cannot interpret, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownRecord {
    pub id: StorageId,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// StorageRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageRecord {
    Contact(ContactRecord),
    GroupV1(GroupV1Record),
    GroupV2(GroupV2Record),
    Account(AccountRecord),
    DistributionList(DistributionListRecord),
    Unknown(UnknownRecord),
}

impl StorageRecord {
    pub fn id(&self) -> &StorageId {
        match self {
            Self::Contact(r) => &r.id,
            Self::GroupV1(r) => &r.id,
            Self::GroupV2(r) => &r.id,
            Self::Account(r) => &r.id,
            Self::DistributionList(r) => &r.id,
            Self::Unknown(r) => &r.id,
        }
    }

    /// The type implied by the record body.
    pub fn body_kind(&self) -> Option<RecordType> {
        match self {
            Self::Contact(_) => Some(RecordType::Contact),
            Self::GroupV1(_) => Some(RecordType::GroupV1),
            Self::GroupV2(_) => Some(RecordType::GroupV2),
            Self::Account(_) => Some(RecordType::Account),
            Self::DistributionList(_) => Some(RecordType::DistributionList),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    pub fn as_contact(&self) -> Option<&ContactRecord> {
        match self {
            Self::Contact(r) => Some(r),
            _ => None,
        }
    }
}

impl From<ContactRecord> for StorageRecord {
    fn from(r: ContactRecord) -> Self {
        Self::Contact(r)
    }
}

impl From<GroupV1Record> for StorageRecord {
    fn from(r: GroupV1Record) -> Self {
        Self::GroupV1(r)
    }
}

impl From<GroupV2Record> for StorageRecord {
    fn from(r: GroupV2Record) -> Self {
        Self::GroupV2(r)
    }
}

impl From<AccountRecord> for StorageRecord {
    fn from(r: AccountRecord) -> Self {
        Self::Account(r)
    }
}

impl From<DistributionListRecord> for StorageRecord {
    fn from(r: DistributionListRecord) -> Self {
        Self::DistributionList(r)
    }
}

impl From<UnknownRecord> for StorageRecord {
    fn from(r: UnknownRecord) -> Self {
        Self::Unknown(r)
    }
}
