// Gallery Ingest - Library Entry Point

pub mod constants;
pub mod error;
pub mod config;
pub mod tools;
pub mod db;
pub mod hash;
pub mod metadata;
pub mod preview;
pub mod catalog;
pub mod ingest;

pub use catalog::{Catalog, SqliteCatalog};
pub use config::GalleryConfig;
pub use error::{GalleryError, Result};
pub use ingest::{DiscoveredFile, DiscoveryReport, ScanError, ScanReport, Scanner};
pub use metadata::{MediaKind, MediaMetadata, MediaProbe, MetadataExtractor};
pub use preview::{FrameThumbnailer, ThumbnailGenerator};

/// Scanner wired to the SQLite catalog and the default extractors
pub type GalleryScanner = Scanner<SqliteCatalog, MediaProbe, FrameThumbnailer>;

/// Open the catalog named by `config` and build a scanner over it.
/// Creates the storage directories if they are missing.
pub fn open_scanner(config: GalleryConfig) -> Result<GalleryScanner> {
    config.ensure_dirs()?;
    let catalog = SqliteCatalog::open(&config.db_path)?;
    let thumbnailer = FrameThumbnailer::with_max_width(config.thumbnail_max_width);
    Ok(Scanner::new(config, catalog, MediaProbe, thumbnailer))
}

/// Build a scanner for read-only use (discovery, listing). Nothing is created:
/// a missing database or originals directory is an error.
pub fn open_scanner_read_only(config: GalleryConfig) -> Result<GalleryScanner> {
    if !config.originals_dir.is_dir() {
        return Err(GalleryError::InvalidPath(format!(
            "Originals directory {} does not exist",
            config.originals_dir.display()
        )));
    }
    let catalog = SqliteCatalog::open_read_only(&config.db_path)?;
    let thumbnailer = FrameThumbnailer::with_max_width(config.thumbnail_max_width);
    Ok(Scanner::new(config, catalog, MediaProbe, thumbnailer))
}
