use std::path::{Path, PathBuf};
use std::{env, fs};

use rusqlite::{Connection, OptionalExtension, params};

use spring_core::{DetectedOccurrence, Profile};

use crate::error::{Result, StoreError};
use crate::schema;

/// `$SPRING_DATA_DIR/spring.db`, else `~/.spring-monitor/spring.db`.
pub fn default_db_path() -> PathBuf {
    let base = env::var("SPRING_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".spring-monitor"));
    base.join("spring.db")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Row of `list_profiles`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileSummary {
    pub id: u32,
    pub name: String,
    pub length: usize,
    pub total_energy: f64,
    pub created_at: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::InvalidData(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Profiles ---

    /// Insert or replace a profile and its samples.
    ///
    /// Replacing a profile keeps its recorded detections.
    pub fn save_profile(&self, profile: &Profile, name: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO profiles (id, name, total_energy) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, total_energy = excluded.total_energy",
            params![profile.id(), name, profile.total_energy()],
        )?;
        tx.execute(
            "DELETE FROM profile_samples WHERE profile_id = ?1",
            [profile.id()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO profile_samples (profile_id, idx, value) VALUES (?1, ?2, ?3)",
            )?;
            for (i, value) in profile.samples().iter().enumerate() {
                insert.execute(params![profile.id(), (i + 1) as i64, value])?;
            }
        }

        tx.commit()?;
        tracing::debug!("saved profile {} ({} samples)", profile.id(), profile.len());
        Ok(())
    }

    pub fn load_profile(&self, id: u32) -> Result<Option<Profile>> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM profiles WHERE id = ?1", [id], |_| Ok(()))
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT value FROM profile_samples WHERE profile_id = ?1 ORDER BY idx")?;
        let samples: Vec<f64> = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        Ok(Some(Profile::new(id, samples)?))
    }

    pub fn list_profiles(&self) -> Result<Vec<ProfileSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.total_energy, p.created_at,
                    (SELECT COUNT(*) FROM profile_samples s WHERE s.profile_id = p.id)
             FROM profiles p ORDER BY p.id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let length: i64 = row.get(4)?;
                Ok(ProfileSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    total_energy: row.get(2)?,
                    created_at: row.get(3)?,
                    length: length as usize,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Remove a profile with its samples and detections. Returns whether it existed.
    pub fn delete_profile(&self, id: u32) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM profiles WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    // --- Detections ---

    pub fn record_detection(
        &self,
        profile_id: u32,
        stream: &str,
        occurrence: &DetectedOccurrence,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO detections (profile_id, stream, time_start, start_cycle, end_cycle,
                                     report_cycle, distance, max_value, min_value, energy, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))",
            params![
                profile_id,
                stream,
                occurrence.start_time(),
                cycle_to_sql(occurrence.start_cycle())?,
                cycle_to_sql(occurrence.end_cycle())?,
                cycle_to_sql(occurrence.report_cycle())?,
                occurrence.distance(),
                occurrence.max_value(),
                occurrence.min_value(),
                occurrence.total_energy(),
            ],
        )?;
        Ok(())
    }

    /// Detections for a profile in recording order, optionally for one stream.
    pub fn detections(
        &self,
        profile_id: u32,
        stream: Option<&str>,
    ) -> Result<Vec<DetectedOccurrence>> {
        let mut stmt = self.conn.prepare(
            "SELECT time_start, start_cycle, end_cycle, report_cycle,
                    distance, max_value, min_value, energy
             FROM detections
             WHERE profile_id = ?1 AND (?2 IS NULL OR stream = ?2)
             ORDER BY id",
        )?;
        let rows: Vec<(String, i64, i64, i64, f64, f64, f64, f64)> = stmt
            .query_map(params![profile_id, stream], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(time, start, end, report, distance, max, min, energy)| {
                DetectedOccurrence::try_new(
                    time,
                    cycle_from_sql(start)?,
                    cycle_from_sql(end)?,
                    cycle_from_sql(report)?,
                    distance,
                    max,
                    min,
                    energy,
                )
                .map_err(|e| StoreError::InvalidData(format!("stored detection: {e}")))
            })
            .collect()
    }
}

fn cycle_to_sql(cycle: u64) -> Result<i64> {
    i64::try_from(cycle)
        .map_err(|_| StoreError::InvalidData(format!("cycle {cycle} exceeds SQLite range")))
}

fn cycle_from_sql(cycle: i64) -> Result<u64> {
    u64::try_from(cycle).map_err(|_| StoreError::InvalidData(format!("negative cycle {cycle}")))
}
