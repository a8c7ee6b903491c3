// Preview generation
//
// Thumbnails are derived data: a failure here never blocks ingestion, the
// record is stored without a thumbnail reference instead.

pub mod thumb;

use std::path::Path;

use crate::error::{GalleryError, Result};
use crate::metadata::{ffprobe, MediaKind};
use thumb::ThumbOptions;

/// Rasterizes a representative still for a media file.
pub trait ThumbnailGenerator {
    /// Write a preview of `source` to `dest`. `Ok` means `dest` now holds a
    /// non-empty image.
    fn generate(&self, source: &Path, dest: &Path, kind: MediaKind) -> Result<()>;
}

/// Default generator: in-process resize for images and gifs, an ffmpeg frame
/// grab for video.
#[derive(Debug, Clone, Default)]
pub struct FrameThumbnailer {
    options: ThumbOptions,
}

impl FrameThumbnailer {
    pub fn new(options: ThumbOptions) -> Self {
        Self { options }
    }

    pub fn with_max_width(max_width: u32) -> Self {
        Self::new(ThumbOptions { max_width, ..ThumbOptions::default() })
    }
}

impl ThumbnailGenerator for FrameThumbnailer {
    fn generate(&self, source: &Path, dest: &Path, kind: MediaKind) -> Result<()> {
        let result = match kind {
            MediaKind::Image | MediaKind::Gif => {
                thumb::generate_image_thumbnail(source, dest, &self.options)
            }
            MediaKind::Video => {
                let duration = ffprobe::probe(source).ok().and_then(|p| p.duration);
                thumb::generate_video_thumbnail(source, dest, duration, &self.options)
            }
        };

        result.map_err(|e| GalleryError::Thumbnail(format!("{}: {}", source.display(), e)))
    }
}
