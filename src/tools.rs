// External tools used for video: ffprobe for metadata, ffmpeg for frames
//
// A tool is looked up in order: its GALLERY_*_PATH override, next to the
// running binary (or in a bin/ beside it), then by bare name on PATH.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffprobe,
    Ffmpeg,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Ffprobe, Tool::Ffmpeg];

    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::Ffprobe => "ffprobe",
            Tool::Ffmpeg => "ffmpeg",
        }
    }

    fn env_override(self) -> &'static str {
        match self {
            Tool::Ffprobe => "GALLERY_FFPROBE_PATH",
            Tool::Ffmpeg => "GALLERY_FFMPEG_PATH",
        }
    }

    /// Path to invoke. Falls back to the bare name so the OS searches PATH.
    pub fn path(self) -> PathBuf {
        locate(self.env_override(), self.binary_name())
    }

    /// True when the resolved binary exists or answers `-version`
    pub fn is_available(self) -> bool {
        let path = self.path();
        path.exists()
            || Command::new(&path)
                .arg("-version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

fn locate(env_key: &str, name: &str) -> PathBuf {
    let from_env = std::env::var_os(env_key).map(PathBuf::from);

    let file_name = if cfg!(windows) { format!("{}.exe", name) } else { name.to_string() };
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .into_iter()
        .flat_map(|dir| [dir.join(&file_name), dir.join("bin").join(&file_name)]);

    from_env
        .into_iter()
        .chain(beside_exe)
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}
