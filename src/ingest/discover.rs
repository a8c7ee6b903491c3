// File discovery and tracked-state matching for scans

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::db::schema::TrackedRecord;
use crate::error::{GalleryError, Result};
use crate::metadata::MediaKind;

/// A supported media file found under the source tree
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: MediaKind,
}

/// Discover every supported media file under `root`, recursively, in path order.
///
/// Only an unreadable root is an error. Entries that vanish or cannot be read
/// mid-walk are logged and skipped.
pub fn discover_media_files(root: &Path) -> Result<Vec<Candidate>> {
    std::fs::read_dir(root).map_err(|e| {
        GalleryError::InvalidPath(format!("Cannot enumerate {}: {}", root.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(kind) = MediaKind::from_path(entry.path()) {
            files.push(Candidate {
                path: entry.path().to_path_buf(),
                kind,
            });
        }
    }

    Ok(files)
}

/// Which signal matched a file to an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedBy {
    Path,
    Filename,
    Hash,
}

/// Snapshot of the catalog used by discovery to decide "already tracked".
/// Built once per scan and never persisted.
#[derive(Debug, Default)]
pub struct TrackedState {
    hashes: HashSet<String>,
    filenames: HashSet<String>,
    paths: HashSet<PathBuf>,
}

impl TrackedState {
    /// Index records by hash, filename and resolved absolute path. Both the
    /// record's storage-relative `path` and its legacy `original_path` (if any)
    /// count as known paths.
    pub fn from_records(records: &[TrackedRecord], storage_root: &Path) -> Self {
        let mut state = TrackedState::default();
        for record in records {
            state.hashes.insert(record.hash.clone());
            state.filenames.insert(record.filename.clone());
            state.paths.insert(resolve_stored_path(storage_root, &record.path));
            if let Some(ref original) = record.original_path {
                state.paths.insert(resolve_stored_path(storage_root, original));
            }
        }
        state
    }

    /// Match `path` against the snapshot. Precedence is path, then filename,
    /// then hash; `hash_of` runs only when the cheaper checks miss. Returns
    /// the matching signal (or `None`) plus the hash if it was computed.
    pub fn classify<F>(&self, path: &Path, hash_of: F) -> Result<(Option<TrackedBy>, Option<String>)>
    where
        F: FnOnce(&Path) -> Result<String>,
    {
        if self.paths.contains(&normalize(path)) {
            return Ok((Some(TrackedBy::Path), None));
        }

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.filenames.contains(filename) {
            return Ok((Some(TrackedBy::Filename), None));
        }

        let hash = hash_of(path)?;
        if self.hashes.contains(&hash) {
            return Ok((Some(TrackedBy::Hash), Some(hash)));
        }
        Ok((None, Some(hash)))
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Stored paths are storage-root relative with '/' separators; legacy values
/// may already be absolute.
fn resolve_stored_path(storage_root: &Path, stored: &str) -> PathBuf {
    let as_path = Path::new(stored);
    if as_path.is_absolute() {
        normalize(as_path)
    } else {
        normalize(&super::resolve_relative(storage_root, stored))
    }
}

/// Canonicalize when the file exists so symlinked roots compare equal;
/// otherwise keep the path as given.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
