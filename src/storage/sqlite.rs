//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunCounts, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, title, started_at, finished_at, config_hash, gallery, resumed,
     status, added, skipped, failed, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        gallery: row.get(5)?,
        resumed: row.get(6)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(7)?).unwrap_or(RunStatus::Failed),
        counts: RunCounts {
            added: row.get::<_, i64>(8)? as u64,
            skipped: row.get::<_, i64>(9)? as u64,
            failed: row.get::<_, i64>(10)? as u64,
        },
        error_message: row.get(11)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn begin_run(
        &mut self,
        title: &str,
        config_hash: &str,
        gallery: bool,
        resumed: bool,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();

        let stale = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE title = ?3 AND status = ?4",
            params![
                RunStatus::Interrupted.to_db_string(),
                now,
                title,
                RunStatus::Running.to_db_string()
            ],
        )?;
        if stale > 0 {
            tracing::warn!(
                "Previous run of '{}' did not finish cleanly, marked interrupted",
                title
            );
        }

        self.conn.execute(
            "INSERT INTO runs (title, started_at, config_hash, gallery, resumed, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                title,
                now,
                config_hash,
                gallery,
                resumed,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, added = ?3, skipped = ?4,
             failed = ?5, error_message = ?6 WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                counts.added as i64,
                counts.skipped as i64,
                counts.failed as i64,
                error_message,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        stmt.query_row(params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self, title: &str) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs WHERE title = ?1 ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        let run = stmt.query_row(params![title], run_from_row).optional()?;
        Ok(run)
    }

    fn list_runs(&self, title: Option<&str>, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs WHERE ?1 IS NULL OR title = ?1 ORDER BY id DESC LIMIT ?2",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![title, limit], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    // ===== Statistics =====

    fn total_added(&self, title: &str) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(added), 0) FROM runs WHERE title = ?1",
            params![title],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }
}
