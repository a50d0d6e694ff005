//! Configuration module for Page-Hoard
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use page_hoard::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("page-hoard.toml")).unwrap();
//! println!("Archives go to: {}", config.output.archive_dir);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, OutputConfig, SourceEntry, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
