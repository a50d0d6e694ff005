//! Archive traits and error types

use thiserror::Error;

/// Errors that can occur while reading or extending an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Entry '{0}' already exists in the archive")]
    DuplicateEntry(String),

    #[error("Append journal {0} is truncated")]
    CorruptJournal(std::path::PathBuf),
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// An append-only container of named byte blobs
///
/// Implementations list their entries once when opened; the listing is not refreshed
/// by later appends.
pub trait Archive {
    /// Entry names present when the archive was opened
    fn entry_names(&self) -> &[String];

    /// Appends a new entry and commits it durably before returning
    fn append(&mut self, name: &str, bytes: &[u8]) -> ArchiveResult<()>;
}
