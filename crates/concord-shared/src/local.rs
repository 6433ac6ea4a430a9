//! Local relational rows the storage records project onto.
//!
//! A row owns a storage key only once it has been synced; `storage_id` is
//! `None` until then.

use serde::{Deserialize, Serialize};

use crate::groups::{GroupIdV1, GroupIdV2, GroupMasterKey};
use crate::ids::{Aci, DistributionId, Pni, RawId};
use crate::records::{AccountSettings, IdentityState, StorySendMode};

// ---------------------------------------------------------------------------
// Self / account
// ---------------------------------------------------------------------------

/// The identities of the local device's own account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIdentity {
    pub aci: Aci,
    pub pni: Option<Pni>,
    pub e164: Option<String>,
}

impl SelfIdentity {
    /// Whether any of the given identifiers belong to this account.
    pub fn matches(&self, aci: Option<&Aci>, pni: Option<&Pni>, e164: Option<&str>) -> bool {
        aci.is_some_and(|a| *a == self.aci)
            || pni.is_some_and(|p| self.pni.as_ref() == Some(p))
            || e164.is_some_and(|e| self.e164.as_deref() == Some(e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAccount {
    pub identity: SelfIdentity,
    pub storage_id: Option<RawId>,
    pub given_name: String,
    pub family_name: String,
    pub avatar_url_path: String,
    pub profile_key: Option<Vec<u8>>,
    pub settings: AccountSettings,
    pub unknown_fields: Vec<u8>,
}

impl LocalAccount {
    pub fn new(identity: SelfIdentity) -> Self {
        Self {
            identity,
            storage_id: None,
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
// Recipient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(pub i64);

impl RecipientId {
    /// Placeholder for rows that have not been inserted yet.
    pub const UNASSIGNED: RecipientId = RecipientId(0);
}

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecipientId({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientKind {
    Contact {
        aci: Option<Aci>,
        pni: Option<Pni>,
        e164: Option<String>,
    },
    GroupV1 {
        group_id: GroupIdV1,
    },
    GroupV2 {
        master_key: GroupMasterKey,
    },
}

/// A contact or group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub storage_id: Option<RawId>,
    pub kind: RecipientKind,
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
    pub mute_until: u64,
    pub unregistered_at: u64,
    pub dont_notify_for_mentions_if_muted: bool,
    pub story_send_mode: StorySendMode,
    /// Opaque remote fields carried for the row's storage record.
    pub unknown_fields: Vec<u8>,
}

impl Recipient {
    pub fn new(kind: RecipientKind) -> Self {
        Self {
            id: RecipientId::UNASSIGNED,
            storage_id: None,
            kind,
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
            dont_notify_for_mentions_if_muted: false,
            story_send_mode: StorySendMode::Default,
            unknown_fields: Vec::new(),
        }
    }

    pub fn contact(aci: Option<Aci>, pni: Option<Pni>, e164: Option<String>) -> Self {
        Self::new(RecipientKind::Contact { aci, pni, e164 })
    }

    pub fn aci(&self) -> Option<Aci> {
        match &self.kind {
            RecipientKind::Contact { aci, .. } => *aci,
            _ => None,
        }
    }

    pub fn pni(&self) -> Option<Pni> {
        match &self.kind {
            RecipientKind::Contact { pni, .. } => *pni,
            _ => None,
        }
    }

    pub fn e164(&self) -> Option<&str> {
        match &self.kind {
            RecipientKind::Contact { e164, .. } => e164.as_deref(),
            _ => None,
        }
    }

    pub fn group_v1_id(&self) -> Option<GroupIdV1> {
        match &self.kind {
            RecipientKind::GroupV1 { group_id } => Some(*group_id),
            _ => None,
        }
    }

    pub fn group_v2_id(&self) -> Option<GroupIdV2> {
        match &self.kind {
            RecipientKind::GroupV2 { master_key } => Some(master_key.group_id()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Distribution list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionListRow {
    /// Local row id; 0 until inserted.
    pub id: i64,
    pub distribution_id: DistributionId,
    pub storage_id: Option<RawId>,
    pub name: String,
    pub members: Vec<Aci>,
    pub deleted_at: u64,
    pub allows_replies: bool,
    pub is_block_list: bool,
    pub unknown_fields: Vec<u8>,
}

impl DistributionListRow {
    pub fn new(distribution_id: DistributionId, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            distribution_id,
            storage_id: None,
            name: name.into(),
            members: Vec::new(),
            deleted_at: 0,
            allows_replies: true,
            is_block_list: false,
            unknown_fields: Vec::new(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at > 0
    }
}
