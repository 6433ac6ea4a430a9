//! Records of a type this build cannot interpret, kept so their keys survive.

use rusqlite::{params, Connection};

use concord_shared::{RecordType, StorageId, UnknownRecord};

use crate::database::raw_from_sql;
use crate::error::Result;

pub(crate) fn list(conn: &Connection) -> Result<Vec<UnknownRecord>> {
    let mut stmt = conn.prepare(
        "SELECT storage_id, record_type, data
         FROM unknown_records
         ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let raw = raw_from_sql(0, Some(row.get(0)?))?.ok_or(rusqlite::Error::InvalidColumnType(
            0,
            "storage_id".into(),
            rusqlite::types::Type::Null,
        ))?;
        let wire: u32 = row.get(1)?;
        Ok(UnknownRecord {
            id: StorageId::new(RecordType::from_wire(wire), raw),
            data: row.get(2)?,
        })
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

pub(crate) fn insert(conn: &Connection, records: &[UnknownRecord]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO unknown_records (storage_id, record_type, data)
         VALUES (?1, ?2, ?3)",
    )?;
    for record in records {
        stmt.execute(params![
            record.id.raw.to_hex(),
            record.id.kind.to_wire(),
            record.data
        ])?;
    }
    Ok(())
}

pub(crate) fn delete(conn: &Connection, ids: &[concord_shared::RawId]) -> Result<()> {
    let mut stmt = conn.prepare("DELETE FROM unknown_records WHERE storage_id = ?1")?;
    for raw in ids {
        stmt.execute(params![raw.to_hex()])?;
    }
    Ok(())
}
