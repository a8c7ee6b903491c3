// Metadata extraction module

pub mod ffprobe;
pub mod image_info;

use std::fmt;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::constants::{GIF_EXTENSIONS, IMAGE_EXTENSIONS, KIND_GIF, KIND_IMAGE, KIND_VIDEO, VIDEO_EXTENSIONS};
use crate::error::{GalleryError, Result};

/// Kind of media, fixed at ingestion from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Gif,
    Video,
}

impl MediaKind {
    /// Classify a path by its (case-insensitive) extension. Unsupported
    /// extensions yield `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if GIF_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Gif)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => KIND_IMAGE,
            MediaKind::Gif => KIND_GIF,
            MediaKind::Video => KIND_VIDEO,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            KIND_IMAGE => Some(MediaKind::Image),
            KIND_GIF => Some(MediaKind::Gif),
            KIND_VIDEO => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Descriptive metadata for one media file. Dimensions and duration are
/// `None` when they do not apply, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub mime_type: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Seconds; video and animated gif only
    pub duration: Option<f64>,
}

/// Reads metadata from a file of a known kind.
///
/// Implementations return `GalleryError::Metadata` (or `FFprobe`) for corrupt or
/// unreadable files; the scanner records the failure against that file only.
pub trait MetadataExtractor {
    fn extract(&self, path: &Path, kind: MediaKind) -> Result<MediaMetadata>;
}

/// Default extractor: still images and gifs are decoded in-process, video goes
/// through ffprobe.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaProbe;

impl MetadataExtractor for MediaProbe {
    fn extract(&self, path: &Path, kind: MediaKind) -> Result<MediaMetadata> {
        let file_size = std::fs::metadata(path)
            .map_err(|e| GalleryError::Metadata(format!("Cannot stat {}: {}", path.display(), e)))?
            .len() as i64;

        let mut meta = MediaMetadata {
            mime_type: mime_type_for_path(path),
            file_size,
            ..MediaMetadata::default()
        };

        match kind {
            MediaKind::Image => {
                let (width, height) = image_info::dimensions(path)?;
                meta.width = Some(width);
                meta.height = Some(height);
            }
            MediaKind::Gif => {
                let info = image_info::gif_info(path)?;
                meta.width = Some(info.width);
                meta.height = Some(info.height);
                meta.duration = info.animated_duration();
            }
            MediaKind::Video => {
                let probe = ffprobe::probe(path)?;
                meta.width = probe.width;
                meta.height = probe.height;
                meta.duration = probe.duration;
            }
        }

        Ok(meta)
    }
}

/// MIME type from the extension table. Unknown extensions fall back to
/// application/octet-stream.
pub fn mime_type_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a.jpg")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("a.JPEG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("a.tiff")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("a.Gif")), Some(MediaKind::Gif));
        assert_eq!(MediaKind::from_path(Path::new("clip.MKV")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("README")), None);
        assert_eq!(MediaKind::from_extension(".webm"), Some(MediaKind::Video));
    }

    #[test]
    fn test_kind_string_form() {
        for kind in [MediaKind::Image, MediaKind::Gif, MediaKind::Video] {
            assert_eq!(MediaKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MediaKind::parse("audio"), None);
        assert_eq!(serde_json::to_string(&MediaKind::Gif).unwrap(), "\"gif\"");
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for_path(Path::new("x.JPG")), "image/jpeg");
        assert_eq!(mime_type_for_path(Path::new("x.mov")), "video/quicktime");
        assert_eq!(mime_type_for_path(Path::new("x.bin")), "application/octet-stream");
    }

    #[test]
    fn test_probe_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("still.png");
        image::RgbImage::new(7, 3).save(&path).unwrap();

        let meta = MediaProbe.extract(&path, MediaKind::Image).unwrap();
        assert_eq!(meta.mime_type, "image/png");
        assert_eq!(meta.width, Some(7));
        assert_eq!(meta.height, Some(3));
        assert_eq!(meta.duration, None);
        assert!(meta.file_size > 0);
    }

    #[test]
    fn test_probe_corrupt_image_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = MediaProbe.extract(&path, MediaKind::Image).unwrap_err();
        assert!(matches!(err, GalleryError::Metadata(_)));
    }

    #[test]
    fn test_probe_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let err = MediaProbe.extract(&tmp.path().join("gone.png"), MediaKind::Image).unwrap_err();
        assert!(matches!(err, GalleryError::Metadata(_)));
    }
}
