// Gallery Constants
// Folder names and extension tables are part of the on-disk layout. Changing them
// orphans existing catalogs.

// Hashing
pub const HASH_ALGORITHM: &str = "blake3";
pub const HASH_CHUNK_SIZE: usize = 1_048_576; // 1MB
pub const HASH_FULL_SCHEME: &str = "full";

// Paths
pub const PATH_DB_SEPARATOR: char = '/';
pub const GALLERY_FOLDER: &str = ".gallery";
pub const DB_FILENAME: &str = "gallery.db";
pub const CONFIG_FILENAME: &str = "config.json";
pub const ORIGINALS_FOLDER: &str = "originals";
pub const THUMBNAILS_FOLDER: &str = "thumbnails";

// Thumbnail settings
pub const THUMB_FORMAT: &str = "jpg";
pub const THUMB_QUALITY: u32 = 85;
pub const THUMB_MAX_WIDTH: u32 = 480;

// Rename attempts when the probed name is taken before the rename lands
pub const RENAME_MAX_ATTEMPTS: usize = 3;

// Media kinds, as stored in the catalog
pub const KIND_IMAGE: &str = "image";
pub const KIND_GIF: &str = "gif";
pub const KIND_VIDEO: &str = "video";

// Image extensions
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "bmp", "tiff"];

// Gif extensions
pub const GIF_EXTENSIONS: [&str; 1] = ["gif"];

// Video extensions
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "webm", "mov", "avi", "mkv"];
