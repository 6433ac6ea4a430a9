//! The single local account row.

use rusqlite::{params, Connection, OptionalExtension};

use concord_shared::local::{LocalAccount, SelfIdentity};
use concord_shared::{AccountSettings, Aci, Pni};

use crate::database::{conversion_err, raw_from_sql, raw_to_sql, uuid_from_sql, Database};
use crate::error::{Result, StoreError};

impl Database {
    /// Create or overwrite the local account.
    pub fn set_local_account(&self, account: &LocalAccount) -> Result<()> {
        upsert(self.conn(), account)
    }

    pub fn local_account(&self) -> Result<LocalAccount> {
        load(self.conn())
    }
}

pub(crate) fn upsert(conn: &Connection, account: &LocalAccount) -> Result<()> {
    conn.execute(
        "INSERT INTO local_account
            (id, aci, pni, e164, storage_id, given_name, family_name, avatar_url_path,
             profile_key, settings, unknown_fields)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
            aci = excluded.aci, pni = excluded.pni, e164 = excluded.e164,
            storage_id = excluded.storage_id, given_name = excluded.given_name,
            family_name = excluded.family_name, avatar_url_path = excluded.avatar_url_path,
            profile_key = excluded.profile_key, settings = excluded.settings,
            unknown_fields = excluded.unknown_fields",
        params![
            account.identity.aci.0.to_string(),
            account.identity.pni.map(|p| p.0.to_string()),
            account.identity.e164,
            raw_to_sql(account.storage_id.as_ref()),
            account.given_name,
            account.family_name,
            account.avatar_url_path,
            account.profile_key,
            serde_json::to_string(&account.settings)?,
            account.unknown_fields,
        ],
    )?;
    Ok(())
}

pub(crate) fn load(conn: &Connection) -> Result<LocalAccount> {
    conn.query_row(
        "SELECT aci, pni, e164, storage_id, given_name, family_name, avatar_url_path,
                profile_key, settings, unknown_fields
         FROM local_account
         WHERE id = 1",
        [],
        |row| {
            let aci = uuid_from_sql(0, row.get(0)?)?.map(Aci).ok_or(
                rusqlite::Error::InvalidColumnType(0, "aci".into(), rusqlite::types::Type::Null),
            )?;
            let settings_json: String = row.get(8)?;
            let settings: AccountSettings =
                serde_json::from_str(&settings_json).map_err(|e| conversion_err(8, e))?;

            Ok(LocalAccount {
                identity: SelfIdentity {
                    aci,
                    pni: uuid_from_sql(1, row.get(1)?)?.map(Pni),
                    e164: row.get(2)?,
                },
                storage_id: raw_from_sql(3, row.get(3)?)?,
                given_name: row.get(4)?,
                family_name: row.get(5)?,
                avatar_url_path: row.get(6)?,
                profile_key: row.get(7)?,
                settings,
                unknown_fields: row.get(9)?,
            })
        },
    )
    .optional()?
    .ok_or(StoreError::NoLocalAccount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_shared::{PinnedConversation, RawId};
    use uuid::Uuid;

    fn identity() -> SelfIdentity {
        SelfIdentity {
            aci: Aci(Uuid::from_u128(1)),
            pni: Some(Pni(Uuid::from_u128(2))),
            e164: Some("+15555550100".into()),
        }
    }

    #[test]
    fn missing_account_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.local_account(), Err(StoreError::NoLocalAccount)));
    }

    #[test]
    fn settings_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut account = LocalAccount::new(identity());
        account.settings.read_receipts = true;
        account.settings.pinned_conversations = vec![PinnedConversation::Contact {
            aci: Some(Aci(Uuid::from_u128(5))),
            e164: None,
        }];
        db.set_local_account(&account).unwrap();
        assert_eq!(db.local_account().unwrap(), account);

        account.storage_id = Some(RawId([1; 16]));
        db.set_local_account(&account).unwrap();
        assert_eq!(db.local_account().unwrap().storage_id, Some(RawId([1; 16])));
    }
}
