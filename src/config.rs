// Gallery configuration
//
// Passed explicitly into the scanner. Nothing here reads process-wide state
// except `discover`, which the CLI uses to find a config file.

use std::path::{Component, Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_FILENAME, DB_FILENAME, GALLERY_FOLDER, ORIGINALS_FOLDER, THUMBNAILS_FOLDER,
    THUMB_MAX_WIDTH,
};
use crate::error::{GalleryError, Result};

/// Directory layout and tunables for one gallery.
///
/// `originals_dir` and `thumbnails_dir` must live under `storage_root`: catalog
/// paths are stored relative to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryConfig {
    pub storage_root: PathBuf,
    pub originals_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub db_path: PathBuf,
    #[serde(default = "default_thumbnail_max_width")]
    pub thumbnail_max_width: u32,
}

fn default_thumbnail_max_width() -> u32 {
    THUMB_MAX_WIDTH
}

/// On-disk shape of a config file. Every field is optional; relative
/// directories are resolved against the storage root.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    storage_root: Option<PathBuf>,
    originals_dir: Option<PathBuf>,
    thumbnails_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    thumbnail_max_width: Option<u32>,
}

impl GalleryConfig {
    /// Default layout under a storage root:
    /// originals/, thumbnails/ and .gallery/gallery.db
    pub fn for_storage_root(storage_root: impl Into<PathBuf>) -> Self {
        let storage_root = storage_root.into();
        Self {
            originals_dir: storage_root.join(ORIGINALS_FOLDER),
            thumbnails_dir: storage_root.join(THUMBNAILS_FOLDER),
            db_path: storage_root.join(GALLERY_FOLDER).join(DB_FILENAME),
            thumbnail_max_width: THUMB_MAX_WIDTH,
            storage_root,
        }
    }

    /// Load a JSON config file. `default_root` is used when the file does not
    /// name a storage root.
    pub fn load(path: &Path, default_root: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GalleryError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let file: ConfigFile = serde_json::from_str(&raw)
            .map_err(|e| GalleryError::Config(format!("Invalid config {}: {}", path.display(), e)))?;

        let root = file.storage_root.unwrap_or_else(|| default_root.to_path_buf());
        let mut config = Self::for_storage_root(root);

        if let Some(dir) = file.originals_dir {
            config.originals_dir = config.storage_root.join(dir);
        }
        if let Some(dir) = file.thumbnails_dir {
            config.thumbnails_dir = config.storage_root.join(dir);
        }
        if let Some(db) = file.db_path {
            config.db_path = config.storage_root.join(db);
        }
        if let Some(width) = file.thumbnail_max_width {
            config.thumbnail_max_width = width;
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolve the config for a storage root: an explicit file wins, then
    /// <root>/.gallery/config.json, then ~/.gallery/config.json, then defaults.
    pub fn discover(storage_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path, storage_root);
        }

        let local = storage_root.join(GALLERY_FOLDER).join(CONFIG_FILENAME);
        if local.is_file() {
            return Self::load(&local, storage_root);
        }

        if let Some(user) = user_config_path() {
            if user.is_file() {
                log::debug!("Using user config {}", user.display());
                return Self::load(&user, storage_root);
            }
        }

        let config = Self::for_storage_root(storage_root);
        config.validate()?;
        Ok(config)
    }

    /// Stored paths are relative to the storage root, so both media trees must
    /// sit beneath it.
    pub fn validate(&self) -> Result<()> {
        for (label, dir) in [("originals_dir", &self.originals_dir), ("thumbnails_dir", &self.thumbnails_dir)] {
            // starts_with is lexical, so "root/../elsewhere" would pass it
            if dir.components().any(|c| matches!(c, Component::ParentDir)) {
                return Err(GalleryError::Config(format!(
                    "{} {} must not contain '..'",
                    label,
                    dir.display()
                )));
            }
            if !dir.starts_with(&self.storage_root) {
                return Err(GalleryError::Config(format!(
                    "{} {} is not under storage root {}",
                    label,
                    dir.display(),
                    self.storage_root.display()
                )));
            }
        }
        if self.thumbnail_max_width == 0 {
            return Err(GalleryError::Config("thumbnail_max_width must be positive".to_string()));
        }
        Ok(())
    }

    /// Create the originals, thumbnails and database directories
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.originals_dir)?;
        std::fs::create_dir_all(&self.thumbnails_dir)?;
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// ~/.gallery/config.json
fn user_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|home| home.home_dir().join(GALLERY_FOLDER).join(CONFIG_FILENAME))
}
