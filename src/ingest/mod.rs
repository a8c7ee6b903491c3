// Ingest pipeline module
//
// Per candidate file:
//   discovered -> hashed -> skipped (known hash)
//                        -> renamed -> metadata -> thumbnail -> staged
//   or errored at the hash / metadata step.
// Staged records are committed in one batch once the walk is done.

pub mod discover;
pub mod naming;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::GalleryConfig;
use crate::constants::{PATH_DB_SEPARATOR, THUMB_FORMAT};
use crate::db::schema::NewMediaRecord;
use crate::error::{GalleryError, Result};
use crate::hash::compute_content_hash;
use crate::metadata::MetadataExtractor;
use crate::preview::ThumbnailGenerator;
use discover::{discover_media_files, Candidate, TrackedState};

/// A file that could not be ingested, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanError {
    pub filename: String,
    pub message: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filename, self.message)
    }
}

/// Result of one ingest run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub new_files: usize,
    pub files: Vec<String>,
    pub errors: Vec<ScanError>,
    /// Files skipped because identical content was already ingested earlier
    /// in the same run
    pub duplicates: Vec<String>,
}

/// An untracked file found by a discovery scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredFile {
    pub path: String,
    pub filename: String,
    pub hash: String,
}

/// Result of a read-only discovery run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub count: usize,
    pub files: Vec<DiscoveredFile>,
}

/// Content hashes one ingest run dedups against: the catalog snapshot taken
/// before the walk plus everything staged since. Owned by a single run and
/// dropped with it.
#[derive(Debug, Default)]
struct RunHashes {
    catalog: HashSet<String>,
    staged: HashSet<String>,
}

impl RunHashes {
    fn new(catalog: HashSet<String>) -> Self {
        Self { catalog, staged: HashSet::new() }
    }

    fn outcome_for(&self, hash: &str) -> Option<FileOutcome> {
        if self.catalog.contains(hash) {
            Some(FileOutcome::Known)
        } else if self.staged.contains(hash) {
            Some(FileOutcome::SameRunDuplicate)
        } else {
            None
        }
    }

    fn stage(&mut self, hash: String) {
        self.staged.insert(hash);
    }
}

/// What happened to one candidate in ingest mode
enum FileOutcome {
    Known,
    SameRunDuplicate,
    Staged(NewMediaRecord),
}

/// Drives ingestion of the originals tree into a catalog.
pub struct Scanner<C, M, T> {
    config: GalleryConfig,
    catalog: C,
    extractor: M,
    thumbnailer: T,
}

impl<C, M, T> Scanner<C, M, T>
where
    C: Catalog,
    M: MetadataExtractor,
    T: ThumbnailGenerator,
{
    pub fn new(config: GalleryConfig, catalog: C, extractor: M, thumbnailer: T) -> Self {
        Self {
            config,
            catalog,
            extractor,
            thumbnailer,
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Ingest every new supported file under the originals directory.
    ///
    /// Per-file failures land in the report. Only an unreadable originals
    /// directory, a failed catalog read, or a failed commit fail the run.
    pub fn run_ingest_scan(&mut self) -> Result<ScanReport> {
        let originals_dir = self.config.originals_dir.clone();
        log::info!("Starting ingest scan of {}", originals_dir.display());

        let mut hashes = RunHashes::new(self.catalog.list_all_hashes()?);
        let candidates = discover_media_files(&originals_dir)?;

        let mut report = ScanReport::default();
        let mut staged = Vec::new();

        for candidate in &candidates {
            match self.ingest_file(candidate, &mut hashes, &mut report) {
                Ok(FileOutcome::Known) => {
                    log::debug!("Already tracked: {}", candidate.path.display());
                }
                Ok(FileOutcome::SameRunDuplicate) => {
                    log::debug!("Duplicate within this run: {}", candidate.path.display());
                    report.duplicates.push(display_name(&candidate.path));
                }
                Ok(FileOutcome::Staged(record)) => {
                    report.files.push(record.filename.clone());
                    staged.push(record);
                }
                Err(e) => {
                    log::error!("Failed to process {}: {}", candidate.path.display(), e);
                    report.errors.push(ScanError {
                        filename: display_name(&candidate.path),
                        message: e.to_string(),
                    });
                }
            }
        }

        if !staged.is_empty() {
            match self.catalog.insert_batch(&staged) {
                Ok(written) => log::info!("Committed {} new media records", written),
                Err(e) => {
                    self.discard_thumbnails(&staged);
                    return Err(e);
                }
            }
        }

        report.new_files = staged.len();
        log::info!(
            "Ingest scan complete: {} candidates, {} new, {} duplicates, {} errors",
            candidates.len(),
            report.new_files,
            report.duplicates.len(),
            report.errors.len()
        );
        Ok(report)
    }

    fn ingest_file(
        &self,
        candidate: &Candidate,
        hashes: &mut RunHashes,
        report: &mut ScanReport,
    ) -> Result<FileOutcome> {
        let hash = compute_content_hash(&candidate.path)?;
        if let Some(outcome) = hashes.outcome_for(&hash) {
            return Ok(outcome);
        }

        // A failed rename is reported but the file is still ingested under its
        // current name
        let path = match naming::rename_to_safe_name(&candidate.path) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Rename failed for {}: {}", candidate.path.display(), e);
                report.errors.push(ScanError {
                    filename: display_name(&candidate.path),
                    message: format!("rename failed: {}", e),
                });
                candidate.path.clone()
            }
        };

        let stored_path = self.relative_to_storage(&path)?;
        let meta = self.extractor.extract(&path, candidate.kind)?;

        let thumb_name = format!("{}.{}", uuid::Uuid::new_v4(), THUMB_FORMAT);
        let thumb_path = self.config.thumbnails_dir.join(thumb_name);
        let stored_thumb = self.relative_to_storage(&thumb_path)?;
        let thumbnail_path = match self.thumbnailer.generate(&path, &thumb_path, candidate.kind) {
            Ok(()) => Some(stored_thumb),
            Err(e) => {
                log::warn!("Thumbnail failed for {}: {}", path.display(), e);
                None
            }
        };

        let record = NewMediaRecord {
            hash: hash.clone(),
            filename: display_name(&path),
            path: stored_path,
            thumbnail_path,
            file_type: candidate.kind,
            mime_type: meta.mime_type,
            file_size: meta.file_size,
            width: meta.width,
            height: meta.height,
            duration: meta.duration,
            original_path: None,
            created_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        };

        hashes.stage(hash);

        Ok(FileOutcome::Staged(record))
    }

    /// Classify every supported file as tracked or untracked without touching
    /// the filesystem or the catalog.
    ///
    /// A file counts as tracked when its resolved path, its filename, or its
    /// content hash matches a record, checked in that order. Whichever record
    /// matches first is treated as canonical.
    pub fn run_discovery_scan(&self) -> Result<DiscoveryReport> {
        let originals_dir = &self.config.originals_dir;
        log::info!("Starting discovery scan of {}", originals_dir.display());

        let records = self.catalog.list_records_for_tracking()?;
        let state = TrackedState::from_records(&records, &self.config.storage_root);
        let candidates = discover_media_files(originals_dir)?;

        let mut report = DiscoveryReport::default();
        for candidate in &candidates {
            match state.classify(&candidate.path, compute_content_hash) {
                Ok((Some(by), _)) => {
                    log::debug!("Tracked by {:?}: {}", by, candidate.path.display());
                }
                Ok((None, hash)) => {
                    report.files.push(DiscoveredFile {
                        path: candidate.path.to_string_lossy().to_string(),
                        filename: display_name(&candidate.path),
                        hash: hash.unwrap_or_default(),
                    });
                }
                Err(e) => {
                    log::warn!("Cannot classify {}: {}", candidate.path.display(), e);
                }
            }
        }

        report.count = report.files.len();
        log::info!(
            "Discovery scan complete: {} candidates, {} untracked",
            candidates.len(),
            report.count
        );
        Ok(report)
    }

    /// Remove thumbnails written for records that never reached the catalog
    fn discard_thumbnails(&self, staged: &[NewMediaRecord]) {
        for thumb in staged.iter().filter_map(|r| r.thumbnail_path.as_deref()) {
            let path = resolve_relative(&self.config.storage_root, thumb);
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Cannot remove orphan thumbnail {}: {}", path.display(), e);
            }
        }
    }

    /// Storage-root-relative, '/'-separated form used in the catalog
    fn relative_to_storage(&self, path: &Path) -> Result<String> {
        relative_path(&self.config.storage_root, path)
    }
}

/// Express `path` relative to `root` with '/' separators
pub fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        GalleryError::InvalidPath(format!(
            "{} is outside storage root {}",
            path.display(),
            root.display()
        ))
    })?;

    // A lossy conversion would store a path that resolves to nothing
    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().ok_or_else(|| {
                GalleryError::InvalidPath(format!("Non UTF-8 path component in {}", path.display()))
            })
        })
        .collect::<Result<Vec<&str>>>()?;
    Ok(parts.join(&PATH_DB_SEPARATOR.to_string()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Location a stored relative path points at
pub fn resolve_relative(root: &Path, stored: &str) -> PathBuf {
    stored
        .split(PATH_DB_SEPARATOR)
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}
