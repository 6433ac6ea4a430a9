//! CRUD operations for [`Recipient`] rows.

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use concord_shared::groups::{GroupIdV1, GroupIdV2, GroupMasterKey};
use concord_shared::local::{Recipient, RecipientId, RecipientKind};
use concord_shared::{Aci, IdentityState, Pni, RawId, StorySendMode};

use crate::database::{bytes_from_hex, conversion_err, raw_from_sql, raw_to_sql, uuid_from_sql, Database};
use crate::error::Result;

const KIND_CONTACT: i64 = 1;
const KIND_GROUP_V1: i64 = 2;
const KIND_GROUP_V2: i64 = 3;

const COLUMNS: &str = "id, kind, aci, pni, e164, group_id, storage_id,
    profile_given_name, profile_family_name, system_given_name, system_family_name,
    profile_key, username, identity_state, identity_key,
    blocked, profile_sharing, archived, forced_unread, hidden, hide_story,
    mute_until, unregistered_at, dont_notify_for_mentions_if_muted, story_send_mode,
    unknown_fields";

impl Database {
    pub fn insert_recipient(&self, recipient: &Recipient) -> Result<RecipientId> {
        insert(self.conn(), recipient)
    }

    pub fn get_recipient(&self, id: RecipientId) -> Result<Option<Recipient>> {
        by_id(self.conn(), id)
    }

    pub fn list_recipients(&self) -> Result<Vec<Recipient>> {
        list(self.conn())
    }
}

pub(crate) fn insert(conn: &Connection, recipient: &Recipient) -> Result<RecipientId> {
    let cols = KindColumns::from(&recipient.kind);
    conn.execute(
        "INSERT INTO recipients (
            kind, aci, pni, e164, group_id, group_v2_id, expected_v2_id, storage_id,
            profile_given_name, profile_family_name, system_given_name, system_family_name,
            profile_key, username, identity_state, identity_key,
            blocked, profile_sharing, archived, forced_unread, hidden, hide_story,
            mute_until, unregistered_at, dont_notify_for_mentions_if_muted, story_send_mode,
            unknown_fields)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)",
        params![
            cols.kind,
            cols.aci,
            cols.pni,
            cols.e164,
            cols.group_id,
            cols.group_v2_id,
            cols.expected_v2_id,
            raw_to_sql(recipient.storage_id.as_ref()),
            recipient.profile_given_name,
            recipient.profile_family_name,
            recipient.system_given_name,
            recipient.system_family_name,
            recipient.profile_key,
            recipient.username,
            identity_state_to_sql(recipient.identity_state),
            recipient.identity_key,
            recipient.blocked,
            recipient.profile_sharing,
            recipient.archived,
            recipient.forced_unread,
            recipient.hidden,
            recipient.hide_story,
            recipient.mute_until as i64,
            recipient.unregistered_at as i64,
            recipient.dont_notify_for_mentions_if_muted,
            story_send_mode_to_sql(recipient.story_send_mode),
            recipient.unknown_fields,
        ],
    )?;
    Ok(RecipientId(conn.last_insert_rowid()))
}

pub(crate) fn update(conn: &Connection, recipient: &Recipient) -> Result<()> {
    let cols = KindColumns::from(&recipient.kind);
    conn.execute(
        "UPDATE recipients SET
            kind = ?2, aci = ?3, pni = ?4, e164 = ?5, group_id = ?6, group_v2_id = ?7,
            expected_v2_id = ?8, storage_id = ?9,
            profile_given_name = ?10, profile_family_name = ?11,
            system_given_name = ?12, system_family_name = ?13,
            profile_key = ?14, username = ?15, identity_state = ?16, identity_key = ?17,
            blocked = ?18, profile_sharing = ?19, archived = ?20, forced_unread = ?21,
            hidden = ?22, hide_story = ?23, mute_until = ?24, unregistered_at = ?25,
            dont_notify_for_mentions_if_muted = ?26, story_send_mode = ?27,
            unknown_fields = ?28
         WHERE id = ?1",
        params![
            recipient.id.0,
            cols.kind,
            cols.aci,
            cols.pni,
            cols.e164,
            cols.group_id,
            cols.group_v2_id,
            cols.expected_v2_id,
            raw_to_sql(recipient.storage_id.as_ref()),
            recipient.profile_given_name,
            recipient.profile_family_name,
            recipient.system_given_name,
            recipient.system_family_name,
            recipient.profile_key,
            recipient.username,
            identity_state_to_sql(recipient.identity_state),
            recipient.identity_key,
            recipient.blocked,
            recipient.profile_sharing,
            recipient.archived,
            recipient.forced_unread,
            recipient.hidden,
            recipient.hide_story,
            recipient.mute_until as i64,
            recipient.unregistered_at as i64,
            recipient.dont_notify_for_mentions_if_muted,
            story_send_mode_to_sql(recipient.story_send_mode),
            recipient.unknown_fields,
        ],
    )?;
    Ok(())
}

pub(crate) fn list(conn: &Connection) -> Result<Vec<Recipient>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM recipients ORDER BY id ASC"))?;
    let rows = stmt.query_map([], row_to_recipient)?;

    let mut recipients = Vec::new();
    for row in rows {
        recipients.push(row?);
    }
    Ok(recipients)
}

pub(crate) fn by_id(conn: &Connection, id: RecipientId) -> Result<Option<Recipient>> {
    find_one(conn, "id", id.0)
}

pub(crate) fn by_aci(conn: &Connection, aci: &Aci) -> Result<Option<Recipient>> {
    find_one(conn, "aci", aci.0.to_string())
}

pub(crate) fn by_pni(conn: &Connection, pni: &Pni) -> Result<Option<Recipient>> {
    find_one(conn, "pni", pni.0.to_string())
}

pub(crate) fn by_e164(conn: &Connection, e164: &str) -> Result<Option<Recipient>> {
    find_one(conn, "e164", e164)
}

pub(crate) fn by_group_v1(conn: &Connection, group_id: &GroupIdV1) -> Result<Option<Recipient>> {
    find_one_of_kind(conn, KIND_GROUP_V1, "group_id", &group_id.to_hex())
}

pub(crate) fn by_group_v2(conn: &Connection, group_id: &GroupIdV2) -> Result<Option<Recipient>> {
    find_one_of_kind(conn, KIND_GROUP_V2, "group_v2_id", &group_id.to_hex())
}

pub(crate) fn by_expected_v2(conn: &Connection, group_id: &GroupIdV2) -> Result<Option<Recipient>> {
    find_one_of_kind(conn, KIND_GROUP_V1, "expected_v2_id", &group_id.to_hex())
}

pub(crate) fn by_storage_id(conn: &Connection, raw: &RawId) -> Result<Option<Recipient>> {
    find_one(conn, "storage_id", raw.to_hex())
}

fn find_one<V: ToSql>(conn: &Connection, column: &str, value: V) -> Result<Option<Recipient>> {
    let sql = format!("SELECT {COLUMNS} FROM recipients WHERE {column} = ?1 ORDER BY id ASC LIMIT 1");
    Ok(conn
        .query_row(&sql, params![value], row_to_recipient)
        .optional()?)
}

fn find_one_of_kind(
    conn: &Connection,
    kind: i64,
    column: &str,
    value: &str,
) -> Result<Option<Recipient>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM recipients WHERE kind = ?1 AND {column} = ?2 ORDER BY id ASC LIMIT 1"
    );
    Ok(conn
        .query_row(&sql, params![kind, value], row_to_recipient)
        .optional()?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Kind-dependent columns of a row.
struct KindColumns {
    kind: i64,
    aci: Option<String>,
    pni: Option<String>,
    e164: Option<String>,
    group_id: Option<String>,
    group_v2_id: Option<String>,
    expected_v2_id: Option<String>,
}

impl From<&RecipientKind> for KindColumns {
    fn from(kind: &RecipientKind) -> Self {
        match kind {
            RecipientKind::Contact { aci, pni, e164 } => Self {
                kind: KIND_CONTACT,
                aci: aci.map(|a| a.0.to_string()),
                pni: pni.map(|p| p.0.to_string()),
                e164: e164.clone(),
                group_id: None,
                group_v2_id: None,
                expected_v2_id: None,
            },
            RecipientKind::GroupV1 { group_id } => Self {
                kind: KIND_GROUP_V1,
                aci: None,
                pni: None,
                e164: None,
                group_id: Some(group_id.to_hex()),
                group_v2_id: None,
                expected_v2_id: Some(group_id.expected_v2_id().to_hex()),
            },
            RecipientKind::GroupV2 { master_key } => Self {
                kind: KIND_GROUP_V2,
                aci: None,
                pni: None,
                e164: None,
                group_id: Some(hex::encode(master_key.0)),
                group_v2_id: Some(master_key.group_id().to_hex()),
                expected_v2_id: None,
            },
        }
    }
}

fn identity_state_to_sql(state: IdentityState) -> i64 {
    match state {
        IdentityState::Default => 0,
        IdentityState::Verified => 1,
        IdentityState::Unverified => 2,
    }
}

fn identity_state_from_sql(value: i64) -> IdentityState {
    match value {
        1 => IdentityState::Verified,
        2 => IdentityState::Unverified,
        _ => IdentityState::Default,
    }
}

fn story_send_mode_to_sql(mode: StorySendMode) -> i64 {
    match mode {
        StorySendMode::Default => 0,
        StorySendMode::Enabled => 1,
        StorySendMode::Disabled => 2,
    }
}

fn story_send_mode_from_sql(value: i64) -> StorySendMode {
    match value {
        1 => StorySendMode::Enabled,
        2 => StorySendMode::Disabled,
        _ => StorySendMode::Default,
    }
}

/// Map a `rusqlite::Row` (selected with `COLUMNS`) to a [`Recipient`].
fn row_to_recipient(row: &Row<'_>) -> rusqlite::Result<Recipient> {
    let kind: i64 = row.get(1)?;
    let group_hex: Option<String> = row.get(5)?;

    let kind = match kind {
        KIND_GROUP_V1 | KIND_GROUP_V2 => {
            let hex = group_hex.ok_or(rusqlite::Error::InvalidColumnType(
                5,
                "group_id".into(),
                rusqlite::types::Type::Null,
            ))?;
            let bytes = bytes_from_hex(5, &hex)?;
            if kind == KIND_GROUP_V1 {
                RecipientKind::GroupV1 {
                    group_id: GroupIdV1::from_slice(&bytes).map_err(|e| conversion_err(5, e))?,
                }
            } else {
                RecipientKind::GroupV2 {
                    master_key: GroupMasterKey::from_slice(&bytes).map_err(|e| conversion_err(5, e))?,
                }
            }
        }
        _ => RecipientKind::Contact {
            aci: uuid_from_sql(2, row.get(2)?)?.map(Aci),
            pni: uuid_from_sql(3, row.get(3)?)?.map(Pni),
            e164: row.get(4)?,
        },
    };

    Ok(Recipient {
        id: RecipientId(row.get(0)?),
        storage_id: raw_from_sql(6, row.get(6)?)?,
        kind,
        profile_given_name: row.get(7)?,
        profile_family_name: row.get(8)?,
        system_given_name: row.get(9)?,
        system_family_name: row.get(10)?,
        profile_key: row.get(11)?,
        username: row.get(12)?,
        identity_state: identity_state_from_sql(row.get(13)?),
        identity_key: row.get(14)?,
        blocked: row.get(15)?,
        profile_sharing: row.get(16)?,
        archived: row.get(17)?,
        forced_unread: row.get(18)?,
        hidden: row.get(19)?,
        hide_story: row.get(20)?,
        mute_until: row.get::<_, i64>(21)? as u64,
        unregistered_at: row.get::<_, i64>(22)? as u64,
        dont_notify_for_mentions_if_muted: row.get(23)?,
        story_send_mode: story_send_mode_from_sql(row.get(24)?),
        unknown_fields: row.get(25)?,
    })
}
