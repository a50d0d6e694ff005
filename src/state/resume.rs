//! Resume state store
//!
//! Holds the last archived page record of every title in one JSON file. The file is
//! read once when the store is loaded and rewritten in full on every save.

use crate::record::PageRecord;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or saving resume state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed state file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type for resume state operations
pub type StateResult<T> = Result<T, StateError>;

/// Durable mapping from run title to its last archived page record
///
/// Only one run per title may write its entry at a time; the coordinator holds the
/// title's run lock for as long as it records into the store.
#[derive(Debug)]
pub struct ResumeStore {
    path: PathBuf,
    entries: BTreeMap<String, PageRecord>,
}

impl ResumeStore {
    /// Loads the store from `path`
    ///
    /// A missing file yields an empty store.
    pub fn load(path: &Path) -> StateResult<Self> {
        let entries = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StateError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        tracing::debug!("Loaded resume state for {} titles", entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Returns the last archived record for a title
    pub fn get(&self, title: &str) -> Option<&PageRecord> {
        self.entries.get(title)
    }

    /// Replaces a title's record and persists the whole store
    pub fn record(&mut self, title: &str, record: PageRecord) -> StateResult<()> {
        self.entries.insert(title.to_string(), record);
        self.save()
    }

    /// Writes every entry to disk via a temporary file and a rename
    pub fn save(&self) -> StateResult<()> {
        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };

        let content = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            StateError::Json {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut temp_name = self.path.clone().into_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, content).map_err(io_err)?;
        fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Titles with stored state, in sorted order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
