// In-process image inspection for stills and gifs

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageDecoder};

use crate::error::{GalleryError, Result};

/// Frame layout of a gif.
#[derive(Debug, Clone, PartialEq)]
pub struct GifInfo {
    pub width: i32,
    pub height: i32,
    pub frame_count: usize,
    pub total_delay_ms: f64,
}

impl GifInfo {
    /// Playback length in seconds, only for animated gifs.
    pub fn animated_duration(&self) -> Option<f64> {
        if self.frame_count > 1 {
            Some(self.total_delay_ms / 1000.0)
        } else {
            None
        }
    }
}

/// Read pixel dimensions from the image header
pub fn dimensions(path: &Path) -> Result<(i32, i32)> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| GalleryError::Metadata(format!("Cannot read image {}: {}", path.display(), e)))?;
    Ok((width as i32, height as i32))
}

/// Decode a gif's frames to count them and sum their delays
pub fn gif_info(path: &Path) -> Result<GifInfo> {
    let file = File::open(path)
        .map_err(|e| GalleryError::Metadata(format!("Cannot open {}: {}", path.display(), e)))?;
    let decoder = GifDecoder::new(BufReader::new(file))
        .map_err(|e| GalleryError::Metadata(format!("Invalid gif {}: {}", path.display(), e)))?;

    let (width, height) = decoder.dimensions();

    let mut frame_count = 0usize;
    let mut total_delay_ms = 0.0f64;
    for frame in decoder.into_frames() {
        let frame = frame
            .map_err(|e| GalleryError::Metadata(format!("Corrupt gif frame in {}: {}", path.display(), e)))?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        if denom > 0 {
            total_delay_ms += numer as f64 / denom as f64;
        }
        frame_count += 1;
    }

    Ok(GifInfo {
        width: width as i32,
        height: height as i32,
        frame_count,
        total_delay_ms,
    })
}
