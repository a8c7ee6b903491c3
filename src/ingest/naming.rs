// Filename sanitizing and collision-free renaming for ingest

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use regex::Regex;

use crate::constants::RENAME_MAX_ATTEMPTS;
use crate::error::{GalleryError, Result};

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s\-.]").expect("static regex"))
}

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s_]+").expect("static regex"))
}

/// Split a leaf name into (stem, extension-with-dot). A leading dot does not
/// start an extension, so ".hidden" has none.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && !name[..i].chars().all(|c| c == '.') => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}

/// Rewrite a filename so the stem holds only alphanumerics, whitespace-free
/// underscores, hyphens and dots. The extension is kept verbatim. A stem that
/// sanitizes to nothing is replaced by a fresh UUID.
pub fn sanitize_filename(name: &str) -> String {
    let (stem, ext) = split_name(name);

    let replaced = unsafe_chars().replace_all(stem, "_");
    let collapsed = separator_runs().replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');

    let stem = if trimmed.is_empty() {
        uuid::Uuid::new_v4().simple().to_string()
    } else {
        trimmed.to_string()
    };

    format!("{}{}", stem, ext)
}

/// Sanitize `name` and pick the first free variant in `dir`:
/// `stem.ext`, then `stem_1.ext`, `stem_2.ext`, ...
///
/// Every candidate is checked against the live directory; nothing is cached
/// between calls.
pub fn unique_filename(dir: &Path, name: &str) -> String {
    let safe = sanitize_filename(name);
    if !dir.join(&safe).exists() {
        return safe;
    }

    let (stem, ext) = split_name(&safe);
    let mut counter = 1u64;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, ext);
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Name a file currently called `current_name` in `dir` should carry. Names
/// that are already safe are kept as-is; anything else gets a unique
/// sanitized name.
pub fn resolve_target_name(dir: &Path, current_name: &str) -> String {
    if sanitize_filename(current_name) == current_name {
        return current_name.to_string();
    }
    unique_filename(dir, current_name)
}

/// Rename `path` in place to its resolved safe name. Returns the file's path
/// afterwards (unchanged when no rename was needed).
///
/// Names that are not valid UTF-8 are sanitized from their lossy form, so the
/// replacement characters become underscores and the file always ends up with
/// a UTF-8 name.
pub fn rename_to_safe_name(path: &Path) -> Result<PathBuf> {
    rename_with(path, rename_no_clobber)
}

/// Probe-then-rename loop behind `rename_to_safe_name`. If the probed name is
/// taken before the rename lands, the probe is rerun up to
/// RENAME_MAX_ATTEMPTS times before giving up with `RenameConflict`.
fn rename_with<F>(path: &Path, mut rename: F) -> Result<PathBuf>
where
    F: FnMut(&Path, &Path) -> Result<PathBuf>,
{
    let dir = path
        .parent()
        .ok_or_else(|| GalleryError::InvalidPath(format!("No parent directory: {}", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| GalleryError::InvalidPath(format!("No file name: {}", path.display())))?;
    let is_utf8 = file_name.to_str().is_some();
    let current_name = file_name.to_string_lossy();

    let mut last_err = None;
    for attempt in 1..=RENAME_MAX_ATTEMPTS {
        let target_name = resolve_target_name(dir, &current_name);
        if is_utf8 && target_name == current_name {
            return Ok(path.to_path_buf());
        }

        match rename(path, &dir.join(&target_name)) {
            Ok(target) => return Ok(target),
            Err(e) if e.is_retryable() => {
                log::debug!("Rename attempt {} for {} lost a race: {}", attempt, current_name, e);
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| GalleryError::Other("rename attempts exhausted".to_string())))
}

fn rename_no_clobber(from: &Path, to: &Path) -> Result<PathBuf> {
    if to.exists() {
        return Err(GalleryError::RenameConflict {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }
    fs::rename(from, to)?;
    Ok(to.to_path_buf())
}
