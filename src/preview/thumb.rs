// Thumbnail generation
//
// Creates JPG preview frames for grid display. Stills and gifs are resized
// in-process; videos go through ffmpeg, grabbing a frame 10% in to avoid
// black intros.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::Command;
use anyhow::{Result, anyhow, Context};
use image::codecs::jpeg::JpegEncoder;

use crate::constants::THUMB_QUALITY;

/// Options for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbOptions {
    pub max_width: u32,
    pub seek_percent: f64, // Where to extract frame (0.0 to 1.0)
}

impl Default for ThumbOptions {
    fn default() -> Self {
        Self {
            max_width: crate::constants::THUMB_MAX_WIDTH,
            seek_percent: 0.1,
        }
    }
}

/// Generate a thumbnail from a video file.
pub fn generate_video_thumbnail(
    source_path: &Path,
    output_path: &Path,
    duration_secs: Option<f64>,
    options: &ThumbOptions,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = output_path.with_extension("tmp.jpg");

    let seek_seconds = duration_secs
        .map(|d| d * options.seek_percent)
        .unwrap_or(1.0)
        .max(0.0);
    let seek_time = format_duration(seek_seconds);

    let scale_filter = format!("scale='min({},iw)':-1", options.max_width);

    // FFmpeg quality scale is 1-31 where 1 is best
    let q_value = ((100 - THUMB_QUALITY) as f32 / 100.0 * 30.0 + 1.0) as u32;

    let output = Command::new(crate::tools::Tool::Ffmpeg.path())
        .args(["-y", "-ss", &seek_time, "-i"])
        .arg(source_path)
        .args(["-vframes", "1", "-vf", &scale_filter, "-q:v", &q_value.to_string()])
        .arg(&tmp_path)
        .output()
        .context("Failed to run ffmpeg")?;

    if !output.status.success() {
        let _ = std::fs::remove_file(&tmp_path);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("FFmpeg thumbnail generation failed: {}", stderr.trim()));
    }

    finish_atomic_write(&tmp_path, output_path)
}

/// Generate a thumbnail from a still image or the first frame of a gif.
pub fn generate_image_thumbnail(
    source_path: &Path,
    output_path: &Path,
    options: &ThumbOptions,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let img = image::open(source_path)
        .with_context(|| format!("Cannot decode {}", source_path.display()))?;

    // Never upscale; keep aspect ratio
    let img = if img.width() > options.max_width {
        let height = (img.height() as u64 * options.max_width as u64 / img.width() as u64).max(1) as u32;
        img.thumbnail(options.max_width, height)
    } else {
        img
    };

    let tmp_path = output_path.with_extension("tmp.jpg");
    {
        let writer = BufWriter::new(File::create(&tmp_path)?);
        let encoder = JpegEncoder::new_with_quality(writer, THUMB_QUALITY as u8);
        if let Err(e) = img.to_rgb8().write_with_encoder(encoder) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(anyhow!("JPEG encode failed: {}", e));
        }
    }

    finish_atomic_write(&tmp_path, output_path)
}

/// Move a finished temp file into place and reject empty output.
fn finish_atomic_write(tmp_path: &Path, output_path: &Path) -> Result<()> {
    std::fs::rename(tmp_path, output_path)?;

    if !output_path.exists() || std::fs::metadata(output_path)?.len() == 0 {
        let _ = std::fs::remove_file(output_path);
        return Err(anyhow!("Thumbnail is empty or missing"));
    }

    Ok(())
}

/// Format seconds as HH:MM:SS.mmm for ffmpeg.
fn format_duration(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u32;
    let minutes = ((seconds % 3600.0) / 60.0) as u32;
    let secs = seconds % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}
