//! Storage module for the run history
//!
//! This module records every archive run in a SQLite database:
//! - When it started and finished, and with which configuration
//! - How many entries it added, skipped and failed to fetch
//! - Whether it completed, was interrupted or failed

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// Represents a run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub title: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub gallery: bool,
    pub resumed: bool,
    pub status: RunStatus,
    pub counts: RunCounts,
    pub error_message: Option<String>,
}

/// Per-run entry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    /// Entries written to the archive
    pub added: u64,
    /// Records already present in the archive
    pub skipped: u64,
    /// Images that could not be fetched
    pub failed: u64,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// Stopped on request before the producer was exhausted
    Interrupted,
    /// Stopped early because an image could not be fetched
    Incomplete,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Incomplete => "incomplete",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "incomplete" => Some(Self::Incomplete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
