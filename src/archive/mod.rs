//! Archive module for the per-source image containers
//!
//! This module handles:
//! - Entry naming (sequence prefix plus sanitized image location)
//! - The append-only CBZ backend
//! - The per-title run lock guarding an archive

mod cbz;
mod lock;
mod naming;
mod traits;

pub use cbz::{list_entry_names, CbzArchive};
pub use lock::RunLock;
pub use naming::{
    base_name_of, entry_name, parse_entry_name, sanitize_base_name, SEPARATOR, SEQUENCE_WIDTH,
};
pub use traits::{Archive, ArchiveError, ArchiveResult};

use std::path::{Path, PathBuf};

/// Returns the archive path for a title: `<dir>/<title>.<extension>`
pub fn archive_path(dir: &Path, title: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", title, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_path() {
        let path = archive_path(Path::new("scraped"), "my-comic", "cbz");
        assert_eq!(path, PathBuf::from("scraped/my-comic.cbz"));
    }
}
