//! Page-Hoard: a resumable webcomic and gallery archiver
//!
//! This crate walks a source's linear chain of pages, collects the image on each
//! page and appends it to one CBZ archive per source. Progress is persisted after
//! every written image so an interrupted run picks up where it stopped.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod producer;
pub mod record;
pub mod robots;
pub mod state;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Page-Hoard operations
#[derive(Debug, Error)]
pub enum HoardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No source configured with title '{title}'")]
    UnknownSource { title: String },

    #[error("No page producer registered for site '{site}'")]
    UnknownSite { site: String },

    #[error("Producer for '{title}' broke its contract: {message}")]
    ProducerContract { title: String, message: String },

    #[error("Site '{site}' requires parameter '{key}'")]
    MissingParam { site: String, key: String },

    #[error("A run for '{title}' is already in progress (lock file {})", lock_path.display())]
    RunInProgress { title: String, lock_path: PathBuf },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Cookie file error: {0}")]
    Cookies(#[from] crawler::CookieError),

    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("Resume state error: {0}")]
    State(#[from] state::StateError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Page-Hoard operations
pub type Result<T> = std::result::Result<T, HoardError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{RunCoordinator, RunOptions, RunReport};
pub use producer::{PageProducer, ProducerRegistry};
pub use record::{PageRecord, ParamValue, Params};
pub use state::ResumeStore;
