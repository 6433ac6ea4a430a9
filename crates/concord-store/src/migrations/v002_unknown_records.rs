use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS unknown_records (
    storage_id  TEXT PRIMARY KEY NOT NULL,    -- hex-encoded 16-byte key
    record_type INTEGER NOT NULL,             -- wire type number
    data        BLOB NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
