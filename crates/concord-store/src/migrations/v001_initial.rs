//! v001 -- Initial schema creation.
//!
//! Creates `local_account`, `recipients` and `distribution_lists`.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- The local account (exactly one row)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS local_account (
    id              INTEGER PRIMARY KEY CHECK (id = 1),
    aci             TEXT NOT NULL,             -- UUID
    pni             TEXT,                      -- UUID
    e164            TEXT,
    storage_id      TEXT,                      -- hex-encoded 16-byte key
    given_name      TEXT NOT NULL DEFAULT '',
    family_name     TEXT NOT NULL DEFAULT '',
    avatar_url_path TEXT NOT NULL DEFAULT '',
    profile_key     BLOB,
    settings        TEXT NOT NULL,             -- JSON AccountSettings
    unknown_fields  BLOB NOT NULL DEFAULT x''
);

-- ----------------------------------------------------------------
-- Recipients (contacts and groups)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS recipients (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    kind                INTEGER NOT NULL,      -- 1 contact, 2 group v1, 3 group v2
    aci                 TEXT,
    pni                 TEXT,
    e164                TEXT,
    group_id            TEXT,                  -- hex: v1 id or v2 master key
    group_v2_id         TEXT,                  -- hex: derived v2 id (v2 rows)
    expected_v2_id      TEXT,                  -- hex: migration target (v1 rows)
    storage_id          TEXT UNIQUE,           -- hex-encoded 16-byte key
    profile_given_name  TEXT NOT NULL DEFAULT '',
    profile_family_name TEXT NOT NULL DEFAULT '',
    system_given_name   TEXT NOT NULL DEFAULT '',
    system_family_name  TEXT NOT NULL DEFAULT '',
    profile_key         BLOB,
    username            TEXT NOT NULL DEFAULT '',
    identity_state      INTEGER NOT NULL DEFAULT 0,
    identity_key        BLOB,
    blocked             INTEGER NOT NULL DEFAULT 0,
    profile_sharing     INTEGER NOT NULL DEFAULT 0,
    archived            INTEGER NOT NULL DEFAULT 0,
    forced_unread       INTEGER NOT NULL DEFAULT 0,
    hidden              INTEGER NOT NULL DEFAULT 0,
    hide_story          INTEGER NOT NULL DEFAULT 0,
    mute_until          INTEGER NOT NULL DEFAULT 0,
    unregistered_at     INTEGER NOT NULL DEFAULT 0,
    dont_notify_for_mentions_if_muted INTEGER NOT NULL DEFAULT 0,
    story_send_mode     INTEGER NOT NULL DEFAULT 0,
    unknown_fields      BLOB NOT NULL DEFAULT x''
);

CREATE INDEX IF NOT EXISTS idx_recipients_aci ON recipients(aci);
CREATE INDEX IF NOT EXISTS idx_recipients_pni ON recipients(pni);
CREATE INDEX IF NOT EXISTS idx_recipients_e164 ON recipients(e164);
CREATE INDEX IF NOT EXISTS idx_recipients_group_id ON recipients(group_id);
CREATE INDEX IF NOT EXISTS idx_recipients_group_v2_id ON recipients(group_v2_id);
CREATE INDEX IF NOT EXISTS idx_recipients_expected_v2_id ON recipients(expected_v2_id);

-- ----------------------------------------------------------------
-- Story distribution lists
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS distribution_lists (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    distribution_id TEXT NOT NULL UNIQUE,      -- UUID, nil for My Story
    storage_id      TEXT UNIQUE,
    name            TEXT NOT NULL,
    members         TEXT NOT NULL DEFAULT '[]', -- JSON array of ACIs
    deleted_at      INTEGER NOT NULL DEFAULT 0,
    allows_replies  INTEGER NOT NULL DEFAULT 1,
    is_block_list   INTEGER NOT NULL DEFAULT 0,
    unknown_fields  BLOB NOT NULL DEFAULT x''
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
