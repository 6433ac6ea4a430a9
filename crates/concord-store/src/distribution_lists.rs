//! CRUD operations for story distribution lists.

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use concord_shared::local::DistributionListRow;
use concord_shared::{Aci, DistributionId, RawId};

use crate::database::{conversion_err, raw_from_sql, raw_to_sql, uuid_from_sql, Database};
use crate::error::Result;

const COLUMNS: &str = "id, distribution_id, storage_id, name, members, deleted_at,
    allows_replies, is_block_list, unknown_fields";

impl Database {
    pub fn insert_distribution_list(&self, list: &DistributionListRow) -> Result<i64> {
        insert(self.conn(), list)
    }

    pub fn list_distribution_lists(&self) -> Result<Vec<DistributionListRow>> {
        list_all(self.conn())
    }

    /// Create the My Story list if it does not exist yet.
    pub fn ensure_my_story(&self) -> Result<()> {
        if by_distribution_id(self.conn(), &DistributionId::MY_STORY)?.is_none() {
            tracing::info!("creating My Story distribution list");
            insert(
                self.conn(),
                &DistributionListRow::new(DistributionId::MY_STORY, "My Story"),
            )?;
        }
        Ok(())
    }
}

pub(crate) fn insert(conn: &Connection, list: &DistributionListRow) -> Result<i64> {
    conn.execute(
        "INSERT INTO distribution_lists
            (distribution_id, storage_id, name, members, deleted_at, allows_replies,
             is_block_list, unknown_fields)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            list.distribution_id.0.to_string(),
            raw_to_sql(list.storage_id.as_ref()),
            list.name,
            serde_json::to_string(&list.members)?,
            list.deleted_at as i64,
            list.allows_replies,
            list.is_block_list,
            list.unknown_fields,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update(conn: &Connection, list: &DistributionListRow) -> Result<()> {
    conn.execute(
        "UPDATE distribution_lists SET
            distribution_id = ?2, storage_id = ?3, name = ?4, members = ?5,
            deleted_at = ?6, allows_replies = ?7, is_block_list = ?8, unknown_fields = ?9
         WHERE id = ?1",
        params![
            list.id,
            list.distribution_id.0.to_string(),
            raw_to_sql(list.storage_id.as_ref()),
            list.name,
            serde_json::to_string(&list.members)?,
            list.deleted_at as i64,
            list.allows_replies,
            list.is_block_list,
            list.unknown_fields,
        ],
    )?;
    Ok(())
}

pub(crate) fn list_all(conn: &Connection) -> Result<Vec<DistributionListRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM distribution_lists ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], row_to_list)?;

    let mut lists = Vec::new();
    for row in rows {
        lists.push(row?);
    }
    Ok(lists)
}

pub(crate) fn by_distribution_id(
    conn: &Connection,
    id: &DistributionId,
) -> Result<Option<DistributionListRow>> {
    find_one(conn, "distribution_id", id.0.to_string())
}

pub(crate) fn by_storage_id(conn: &Connection, raw: &RawId) -> Result<Option<DistributionListRow>> {
    find_one(conn, "storage_id", raw.to_hex())
}

fn find_one<V: ToSql>(
    conn: &Connection,
    column: &str,
    value: V,
) -> Result<Option<DistributionListRow>> {
    let sql = format!("SELECT {COLUMNS} FROM distribution_lists WHERE {column} = ?1");
    Ok(conn
        .query_row(&sql, params![value], row_to_list)
        .optional()?)
}

fn row_to_list(row: &Row<'_>) -> rusqlite::Result<DistributionListRow> {
    let distribution_id = uuid_from_sql(1, row.get(1)?)?
        .map(DistributionId)
        .ok_or(rusqlite::Error::InvalidColumnType(
            1,
            "distribution_id".into(),
            rusqlite::types::Type::Null,
        ))?;

    let members_json: String = row.get(4)?;
    let members: Vec<Aci> =
        serde_json::from_str(&members_json).map_err(|e| conversion_err(4, e))?;

    Ok(DistributionListRow {
        id: row.get(0)?,
        distribution_id,
        storage_id: raw_from_sql(2, row.get(2)?)?,
        name: row.get(3)?,
        members,
        deleted_at: row.get::<_, i64>(5)? as u64,
        allows_replies: row.get(6)?,
        is_block_list: row.get(7)?,
        unknown_fields: row.get(8)?,
    })
}
