// FFprobe wrapper for video metadata

use std::path::Path;
use std::process::Command;
use serde::Deserialize;
use crate::error::{GalleryError, Result};

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    width: Option<i32>,
    height: Option<i32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// What ffprobe reports about a video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoProbe {
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Seconds
    pub duration: Option<f64>,
}

/// Run ffprobe on a file and extract dimensions and duration
pub fn probe(path: &Path) -> Result<VideoProbe> {
    let output = Command::new(crate::tools::Tool::Ffprobe.path())
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| GalleryError::FFprobe(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GalleryError::FFprobe(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    parse_probe_output(&output.stdout)
}

/// Parse ffprobe's JSON. The first video stream supplies dimensions; duration
/// comes from that stream, else from the container.
pub fn parse_probe_output(json: &[u8]) -> Result<VideoProbe> {
    let probe_output: FFprobeOutput = serde_json::from_slice(json)
        .map_err(|e| GalleryError::FFprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    let mut probe = VideoProbe::default();
    let mut saw_video = false;

    if let Some(ref streams) = probe_output.streams {
        if let Some(stream) = streams.iter().find(|s| s.codec_type.as_deref() == Some("video")) {
            saw_video = true;
            probe.width = stream.width;
            probe.height = stream.height;
            probe.duration = parse_duration_secs(stream.duration.as_deref());
        }
    }

    if probe.duration.is_none() {
        if let Some(ref format) = probe_output.format {
            probe.duration = parse_duration_secs(format.duration.as_deref());
        }
    }

    if !saw_video {
        return Err(GalleryError::Metadata("No video stream found".to_string()));
    }

    Ok(probe)
}

/// Parse a duration string in seconds ("12.345000")
fn parse_duration_secs(duration_str: Option<&str>) -> Option<f64> {
    let seconds: f64 = duration_str?.parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(seconds)
    } else {
        None
    }
}
