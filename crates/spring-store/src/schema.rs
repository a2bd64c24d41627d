use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 2;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id           INTEGER PRIMARY KEY,
            name         TEXT NOT NULL DEFAULT '',
            total_energy REAL NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS profile_samples (
            profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            idx        INTEGER NOT NULL,
            value      REAL NOT NULL,
            PRIMARY KEY (profile_id, idx)
        );

        CREATE TABLE IF NOT EXISTS detections (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_id   INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            stream       TEXT NOT NULL DEFAULT '',
            time_start   TEXT NOT NULL,
            start_cycle  INTEGER NOT NULL,
            end_cycle    INTEGER NOT NULL,
            report_cycle INTEGER NOT NULL,
            distance     REAL NOT NULL,
            max_value    REAL NOT NULL,
            min_value    REAL NOT NULL,
            energy       REAL NOT NULL,
            recorded_at  TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_det_profile ON detections(profile_id, stream);
        ",
    )?;

    // v1 databases predate recorded_at
    if conn
        .prepare("SELECT recorded_at FROM detections LIMIT 0")
        .is_err()
    {
        conn.execute_batch(
            "ALTER TABLE detections ADD COLUMN recorded_at TEXT NOT NULL DEFAULT '';",
        )?;
        tracing::info!("upgraded detections table to schema v{SCHEMA_VERSION}");
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;
    tracing::info!("schema initialized (v{SCHEMA_VERSION})");

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
