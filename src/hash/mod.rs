// Content hashing using BLAKE3

use std::fs::File;
use std::io::Read;
use std::path::Path;
use crate::constants::{HASH_ALGORITHM, HASH_CHUNK_SIZE, HASH_FULL_SCHEME};
use crate::error::{GalleryError, Result};

/// Compute the BLAKE3 digest of a file's entire contents.
/// Format: "blake3:full:<hex>"
///
/// Only bytes are hashed, never the name or timestamps, so identical content
/// under different names or directories yields the same digest.
pub fn compute_content_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .map_err(|e| GalleryError::Hash(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)
            .map_err(|e| GalleryError::Hash(format!("Failed to read {}: {}", path.display(), e)))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format_digest(hasher.finalize()))
}

fn format_digest(hash: blake3::Hash) -> String {
    format!("{}:{}:{}", HASH_ALGORITHM, HASH_FULL_SCHEME, hash.to_hex())
}
