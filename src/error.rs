// Gallery Error Types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Rename conflict: {} already exists (renaming {})", to.display(), from.display())]
    RenameConflict { from: PathBuf, to: PathBuf },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("FFprobe error: {0}")]
    FFprobe(String),

    #[error("Thumbnail error: {0}")]
    Thumbnail(String),

    #[error("Catalog commit failed: {0}")]
    CatalogCommit(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    Other(String),
}

impl GalleryError {
    /// Rename conflicts are worth another probe; everything else is final for the file.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GalleryError::RenameConflict { .. })
    }
}

impl From<anyhow::Error> for GalleryError {
    fn from(err: anyhow::Error) -> Self {
        GalleryError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
