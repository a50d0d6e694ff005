//! CBZ (zip) archive backend
//!
//! Appends reopen the file, add one stored entry after the existing ones and rewrite
//! the central directory. Existing entry data is never rewritten.
//!
//! An append overwrites the old central directory in place, so the bytes from the
//! directory start to the end of the file are saved to `<archive>.journal` first. The
//! journal is removed once the new directory is synced. Opening an archive with a
//! journal left behind puts the saved bytes back, which drops the unfinished entry and
//! keeps every earlier one.

use crate::archive::traits::{Archive, ArchiveError, ArchiveResult};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// File-backed CBZ archive
pub struct CbzArchive {
    path: PathBuf,
    existing: Vec<String>,
    written: HashSet<String>,
}

impl CbzArchive {
    /// Opens the archive at `path`, creating an empty one if absent
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the `.cbz` file; missing parent directories are created
    ///
    /// # Returns
    ///
    /// * `Ok(CbzArchive)` - The archive with its entry names listed
    /// * `Err(ArchiveError)` - The file could not be created or is not a zip archive
    pub fn open(path: &Path) -> ArchiveResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            tracing::info!("Creating new archive {}", path.display());
            let writer = ZipWriter::new(File::create(path)?);
            let file = writer.finish()?;
            file.sync_all()?;
        }

        let journal = journal_path(path);
        if journal.exists() {
            restore_from_journal(path, &journal)?;
        }

        let existing = list_entry_names(path)?;
        tracing::debug!(
            "Opened archive {} with {} entries",
            path.display(),
            existing.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            existing,
            written: HashSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Archive for CbzArchive {
    fn entry_names(&self) -> &[String] {
        &self.existing
    }

    fn append(&mut self, name: &str, bytes: &[u8]) -> ArchiveResult<()> {
        if self.written.contains(name) || self.existing.iter().any(|n| n == name) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }

        let journal = save_journal(&self.path)?;

        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let mut writer = ZipWriter::new_append(file)?;

        // Images are already compressed
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(name, options)?;
        writer.write_all(bytes)?;

        let file = writer.finish()?;
        file.sync_all()?;
        fs::remove_file(&journal)?;

        self.written.insert(name.to_string());
        Ok(())
    }
}

/// Lists entry names from the central directory without reading entry data
pub fn list_entry_names(path: &Path) -> ArchiveResult<Vec<String>> {
    let archive = ZipArchive::new(File::open(path)?)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// `<archive>.journal` next to the archive
fn journal_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".journal");
    PathBuf::from(name)
}

/// Saves the central directory and everything after it
///
/// Layout: the directory offset as 8 little-endian bytes, then the saved bytes. The
/// journal is written to a temporary name and renamed, so a journal that exists is
/// always complete.
fn save_journal(path: &Path) -> ArchiveResult<PathBuf> {
    let archive = ZipArchive::new(File::open(path)?)?;
    let dir_start = archive.central_directory_start();
    let mut file = archive.into_inner();

    let mut tail = Vec::new();
    file.seek(SeekFrom::Start(dir_start))?;
    file.read_to_end(&mut tail)?;

    let journal = journal_path(path);
    let mut tmp_name = OsString::from(journal.as_os_str());
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut out = File::create(&tmp)?;
    out.write_all(&dir_start.to_le_bytes())?;
    out.write_all(&tail)?;
    out.sync_all()?;
    fs::rename(&tmp, &journal)?;

    Ok(journal)
}

/// Truncates the archive to the saved directory offset and writes the saved bytes back
fn restore_from_journal(path: &Path, journal: &Path) -> ArchiveResult<()> {
    let saved = fs::read(journal)?;
    if saved.len() < 8 {
        return Err(ArchiveError::CorruptJournal(journal.to_path_buf()));
    }
    let (offset, tail) = saved.split_at(8);
    let mut offset_bytes = [0u8; 8];
    offset_bytes.copy_from_slice(offset);
    let offset = u64::from_le_bytes(offset_bytes);

    tracing::warn!(
        "Archive {} has an unfinished append, restoring the directory saved at offset {}",
        path.display(),
        offset
    );

    let mut file = OpenOptions::new().write(true).open(path)?;
    file.set_len(offset)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(tail)?;
    file.sync_all()?;

    fs::remove_file(journal)?;
    Ok(())
}
