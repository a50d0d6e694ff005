//! Storage traits and error types
//!
//! This module defines the trait interface for run history backends and
//! associated error types.

use crate::storage::{RunCounts, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for run history backends
pub trait Storage {
    // ===== Run Management =====

    /// Records the start of a run
    ///
    /// Any earlier run of the same title still marked as running is marked
    /// interrupted first, since only one run per title can be active.
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn begin_run(
        &mut self,
        title: &str,
        config_hash: &str,
        gallery: bool,
        resumed: bool,
    ) -> StorageResult<i64>;

    /// Records the outcome of a run with a finish timestamp
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run of a title
    fn get_latest_run(&self, title: &str) -> StorageResult<Option<RunRecord>>;

    /// Lists the most recent runs, newest first, optionally for one title
    fn list_runs(&self, title: Option<&str>, limit: u32) -> StorageResult<Vec<RunRecord>>;

    // ===== Statistics =====

    /// Sums the entries added by every run of a title
    fn total_added(&self, title: &str) -> StorageResult<u64>;
}
