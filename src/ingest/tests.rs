// End-to-end scanner tests against temp directories and an in-memory catalog

use super::*;
use crate::catalog::SqliteCatalog;
use crate::db::schema::{self, TrackedRecord};
use crate::metadata::{MediaKind, MediaMetadata, MediaProbe};
use crate::preview::FrameThumbnailer;
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;

type ProbeScanner = Scanner<SqliteCatalog, MediaProbe, FrameThumbnailer>;

/// Storage root with the default layout created. Returns (tmp, config).
fn setup_gallery() -> (TempDir, GalleryConfig) {
    let tmp = TempDir::new().unwrap();
    let config = GalleryConfig::for_storage_root(tmp.path());
    config.ensure_dirs().unwrap();
    (tmp, config)
}

fn probe_scanner(config: &GalleryConfig) -> ProbeScanner {
    Scanner::new(
        config.clone(),
        SqliteCatalog::open_in_memory().unwrap(),
        MediaProbe,
        FrameThumbnailer::with_max_width(64),
    )
}

/// Write a small PNG whose content is determined by `shade`
fn write_png(path: &Path, shade: u8) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::from_pixel(8, 6, image::Rgb([shade, 255 - shade, 7])).save(path).unwrap();
}

fn dir_names(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect()
}

fn count_records(scanner: &ProbeScanner) -> i64 {
    scanner.catalog().count_media().unwrap()
}

struct FailingThumbnailer;

impl ThumbnailGenerator for FailingThumbnailer {
    fn generate(&self, _source: &Path, _dest: &Path, _kind: MediaKind) -> Result<()> {
        Err(GalleryError::Thumbnail("renderer unavailable".to_string()))
    }
}

/// Pretends every file is a 2s 640x480 clip
struct FixedVideoExtractor;

impl MetadataExtractor for FixedVideoExtractor {
    fn extract(&self, path: &Path, _kind: MediaKind) -> Result<MediaMetadata> {
        Ok(MediaMetadata {
            mime_type: crate::metadata::mime_type_for_path(path),
            file_size: std::fs::metadata(path)?.len() as i64,
            width: Some(640),
            height: Some(480),
            duration: Some(2.0),
        })
    }
}

/// Catalog whose commit always fails
struct BrokenCatalog;

impl Catalog for BrokenCatalog {
    fn list_all_hashes(&self) -> Result<HashSet<String>> {
        Ok(HashSet::new())
    }

    fn list_records_for_tracking(&self) -> Result<Vec<TrackedRecord>> {
        Ok(Vec::new())
    }

    fn insert_batch(&mut self, _records: &[NewMediaRecord]) -> Result<usize> {
        Err(GalleryError::CatalogCommit("disk full".to_string()))
    }
}

// ---------------------------------------------------------------
// Re-running with no filesystem changes ingests nothing new
// ---------------------------------------------------------------
#[test]
fn test_second_scan_is_noop() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("one.png"), 10);
    write_png(&config.originals_dir.join("nested").join("two.png"), 20);

    let mut scanner = probe_scanner(&config);
    let first = scanner.run_ingest_scan().unwrap();
    assert_eq!(first.new_files, 2);
    assert!(first.errors.is_empty(), "{:?}", first.errors);

    let second = scanner.run_ingest_scan().unwrap();
    assert_eq!(second.new_files, 0);
    assert!(second.files.is_empty());
    assert!(second.errors.is_empty());
    assert!(second.duplicates.is_empty());
    assert_eq!(count_records(&scanner), 2);
}

// ---------------------------------------------------------------
// Identical bytes under two names produce one record
// ---------------------------------------------------------------
#[test]
fn test_same_content_ingested_once() {
    let (_tmp, config) = setup_gallery();
    let first = config.originals_dir.join("a.png");
    write_png(&first, 42);
    std::fs::copy(&first, config.originals_dir.join("b.png")).unwrap();

    let mut scanner = probe_scanner(&config);
    let report = scanner.run_ingest_scan().unwrap();

    assert_eq!(report.new_files, 1);
    assert_eq!(report.files, vec!["a.png".to_string()]);
    assert_eq!(report.duplicates, vec!["b.png".to_string()]);
    assert!(report.errors.is_empty());
    assert_eq!(count_records(&scanner), 1);
}

// ---------------------------------------------------------------
// Names that sanitize alike get stem, stem_1, stem_2
// ---------------------------------------------------------------
#[test]
fn test_colliding_names_get_counters() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("a  b.png"), 1);
    write_png(&config.originals_dir.join("a b.png"), 2);
    write_png(&config.originals_dir.join("a__b.png"), 3);

    let mut scanner = probe_scanner(&config);
    let report = scanner.run_ingest_scan().unwrap();
    assert_eq!(report.new_files, 3, "{:?}", report.errors);

    let expected: BTreeSet<String> = ["a_b.png", "a_b_1.png", "a_b_2.png"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(dir_names(&config.originals_dir), expected);
    assert_eq!(report.files.iter().cloned().collect::<BTreeSet<_>>(), expected);

    let records = scanner.catalog().list_media(10, 0).unwrap();
    for record in records {
        assert_eq!(record.path, format!("originals/{}", record.filename));
        assert!(resolve_relative(&config.storage_root, &record.path).exists());
    }
}

// ---------------------------------------------------------------
// Already-safe names are left alone
// ---------------------------------------------------------------
#[test]
fn test_safe_name_not_renamed() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("keep_me.png"), 5);

    let mut scanner = probe_scanner(&config);
    let report = scanner.run_ingest_scan().unwrap();
    assert_eq!(report.files, vec!["keep_me.png".to_string()]);
    assert!(config.originals_dir.join("keep_me.png").exists());
}

// ---------------------------------------------------------------
// Thumbnail failure still yields a complete record
// ---------------------------------------------------------------
#[test]
fn test_thumbnail_failure_is_not_fatal() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("pic.png"), 99);

    let mut scanner = Scanner::new(
        config.clone(),
        SqliteCatalog::open_in_memory().unwrap(),
        MediaProbe,
        FailingThumbnailer,
    );
    let report = scanner.run_ingest_scan().unwrap();
    assert_eq!(report.new_files, 1);
    assert!(report.errors.is_empty());

    let records = scanner.catalog().list_media(10, 0).unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.thumbnail_path.is_none());
    assert_eq!(record.file_type, MediaKind::Image);
    assert!(record.hash.starts_with("blake3:full:"));
    assert_eq!(record.mime_type, "image/png");
    assert_eq!((record.width, record.height), (Some(8), Some(6)));
    assert!(dir_names(&config.thumbnails_dir).is_empty());
}

// ---------------------------------------------------------------
// Thumbnails are written and referenced relative to the storage root
// ---------------------------------------------------------------
#[test]
fn test_thumbnail_recorded_relative() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("pic.png"), 77);

    let mut scanner = probe_scanner(&config);
    scanner.run_ingest_scan().unwrap();

    let record = scanner.catalog().list_media(1, 0).unwrap().remove(0);
    let thumb = record.thumbnail_path.expect("thumbnail recorded");
    assert!(thumb.starts_with("thumbnails/"));
    assert!(thumb.ends_with(".jpg"));
    assert!(resolve_relative(&config.storage_root, &thumb).is_file());
}

// ---------------------------------------------------------------
// One corrupt file does not stop the others
// ---------------------------------------------------------------
#[test]
fn test_corrupt_file_isolated() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("good1.png"), 1);
    write_png(&config.originals_dir.join("good2.png"), 2);
    std::fs::write(config.originals_dir.join("corrupt.png"), b"not an image at all").unwrap();

    let mut scanner = probe_scanner(&config);
    let report = scanner.run_ingest_scan().unwrap();

    assert_eq!(report.new_files, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].filename, "corrupt.png");
    assert!(report.errors[0].to_string().starts_with("corrupt.png: "));
    assert_eq!(count_records(&scanner), 2);

    // The failed file stays untracked and is retried next run
    let again = scanner.run_ingest_scan().unwrap();
    assert_eq!(again.new_files, 0);
    assert_eq!(again.errors.len(), 1);
}

// ---------------------------------------------------------------
// Rename problems
// ---------------------------------------------------------------
#[cfg(unix)]
#[test]
fn test_non_utf8_name_renamed_and_resolvable() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (_tmp, config) = setup_gallery();
    let original = config.originals_dir.join(OsStr::from_bytes(b"bad\xffname.png"));
    write_png(&original, 12);

    let mut scanner = probe_scanner(&config);
    let report = scanner.run_ingest_scan().unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.files, vec!["bad_name.png".to_string()]);
    assert!(!original.exists());

    let record = scanner.catalog().list_media(1, 0).unwrap().remove(0);
    assert_eq!(record.path, "originals/bad_name.png");
    assert!(resolve_relative(&config.storage_root, &record.path).is_file());
}

#[cfg(unix)]
#[test]
fn test_rename_failure_keeps_original_name() {
    let (_tmp, config) = setup_gallery();
    // 255-byte names: the counter suffix pushes the target past NAME_MAX
    let stem = "x".repeat(249);
    let unsafe_name = format!("a {}.png", stem);
    let taken_name = format!("a_{}.png", stem);
    assert_eq!(unsafe_name.len(), 255);
    write_png(&config.originals_dir.join(&unsafe_name), 30);
    write_png(&config.originals_dir.join(&taken_name), 31);

    let mut scanner = probe_scanner(&config);
    let report = scanner.run_ingest_scan().unwrap();

    assert_eq!(report.new_files, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].filename, unsafe_name);
    assert!(report.errors[0].message.starts_with("rename failed"));
    assert!(report.files.contains(&unsafe_name));

    let records = scanner.catalog().list_media(10, 0).unwrap();
    let kept = records.iter().find(|r| r.filename == unsafe_name).expect("record under original name");
    assert!(resolve_relative(&config.storage_root, &kept.path).is_file());
}

// ---------------------------------------------------------------
// Discovery reports untracked files and changes nothing
// ---------------------------------------------------------------
#[test]
fn test_discovery_is_read_only() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("weird name!.png"), 1);
    write_png(&config.originals_dir.join("b.png"), 2);
    write_png(&config.originals_dir.join("sub").join("c.png"), 3);
    std::fs::write(config.originals_dir.join("readme.txt"), b"skip").unwrap();
    let before = dir_names(&config.originals_dir);

    let mut scanner = probe_scanner(&config);
    let discovered = scanner.run_discovery_scan().unwrap();

    assert_eq!(discovered.count, 3);
    assert_eq!(discovered.files.len(), 3);
    assert!(discovered.files.iter().all(|f| f.hash.starts_with("blake3:full:")));
    assert!(discovered.files.iter().any(|f| f.filename == "weird name!.png"));
    assert_eq!(dir_names(&config.originals_dir), before);
    assert!(dir_names(&config.thumbnails_dir).is_empty());
    assert_eq!(count_records(&scanner), 0);

    // After ingesting, nothing is left to discover
    let report = scanner.run_ingest_scan().unwrap();
    assert_eq!(report.new_files, 3);
    assert_eq!(scanner.run_discovery_scan().unwrap().count, 0);
}

// ---------------------------------------------------------------
// Discovery matches by hash when path and name differ
// ---------------------------------------------------------------
#[test]
fn test_discovery_matches_copies_by_hash() {
    let (_tmp, config) = setup_gallery();
    let original = config.originals_dir.join("first.png");
    write_png(&original, 50);

    let mut scanner = probe_scanner(&config);
    scanner.run_ingest_scan().unwrap();

    std::fs::copy(&original, config.originals_dir.join("copy_of_first.png")).unwrap();
    write_png(&config.originals_dir.join("brand_new.png"), 51);

    let discovered = scanner.run_discovery_scan().unwrap();
    assert_eq!(discovered.count, 1);
    assert_eq!(discovered.files[0].filename, "brand_new.png");
}

// ---------------------------------------------------------------
// Discovery honours legacy original paths on existing records
// ---------------------------------------------------------------
#[test]
fn test_discovery_honours_original_path() {
    let (_tmp, config) = setup_gallery();
    let legacy = config.originals_dir.join("imported").join("old.png");
    write_png(&legacy, 9);

    let scanner = probe_scanner(&config);
    schema::insert_media(
        scanner.catalog().connection(),
        &NewMediaRecord {
            hash: "blake3:full:legacy".to_string(),
            filename: "moved.png".to_string(),
            path: "originals/elsewhere/moved.png".to_string(),
            thumbnail_path: None,
            file_type: MediaKind::Image,
            mime_type: "image/png".to_string(),
            file_size: 1,
            width: None,
            height: None,
            duration: None,
            original_path: Some("originals/imported/old.png".to_string()),
            created_at: "2020-01-01T00:00:00Z".to_string(),
        },
    )
    .unwrap();

    assert_eq!(scanner.run_discovery_scan().unwrap().count, 0);
}

// ---------------------------------------------------------------
// Video and gif metadata flow into records
// ---------------------------------------------------------------
#[test]
fn test_video_record_from_extractor() {
    let (_tmp, config) = setup_gallery();
    std::fs::write(config.originals_dir.join("clip one.mp4"), b"fake video bytes").unwrap();

    let mut scanner = Scanner::new(
        config.clone(),
        SqliteCatalog::open_in_memory().unwrap(),
        FixedVideoExtractor,
        FailingThumbnailer,
    );
    let report = scanner.run_ingest_scan().unwrap();
    assert_eq!(report.files, vec!["clip_one.mp4".to_string()]);

    let record = scanner.catalog().list_media(1, 0).unwrap().remove(0);
    assert_eq!(record.file_type, MediaKind::Video);
    assert_eq!(record.mime_type, "video/mp4");
    assert_eq!(record.duration, Some(2.0));
    assert_eq!(record.file_size, b"fake video bytes".len() as i64);
}

#[test]
fn test_animated_gif_gets_duration() {
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, RgbaImage};

    let (_tmp, config) = setup_gallery();
    let path = config.originals_dir.join("loop.gif");
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GifEncoder::new(file);
        let frames = (0..2u8).map(|i| {
            Frame::from_parts(
                RgbaImage::from_pixel(4, 4, image::Rgba([i * 100, 0, 0, 255])),
                0,
                0,
                Delay::from_numer_denom_ms(250, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }

    let mut scanner = probe_scanner(&config);
    scanner.run_ingest_scan().unwrap();

    let record = scanner.catalog().list_media(1, 0).unwrap().remove(0);
    assert_eq!(record.file_type, MediaKind::Gif);
    assert_eq!((record.width, record.height), (Some(4), Some(4)));
    let duration = record.duration.expect("animated gif duration");
    assert!((duration - 0.5).abs() < 0.001);
    assert!(record.thumbnail_path.is_some());
}

// ---------------------------------------------------------------
// Run-level failures
// ---------------------------------------------------------------
#[test]
fn test_commit_failure_fails_run() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("x.png"), 3);

    let mut scanner = Scanner::new(config.clone(), BrokenCatalog, MediaProbe, FailingThumbnailer);
    let err = scanner.run_ingest_scan().unwrap_err();
    assert!(matches!(err, GalleryError::CatalogCommit(_)));
}

#[test]
fn test_commit_failure_removes_run_thumbnails() {
    let (_tmp, config) = setup_gallery();
    write_png(&config.originals_dir.join("x.png"), 3);
    write_png(&config.originals_dir.join("y.png"), 4);

    let mut scanner = Scanner::new(
        config.clone(),
        BrokenCatalog,
        MediaProbe,
        FrameThumbnailer::with_max_width(64),
    );
    for _ in 0..2 {
        assert!(scanner.run_ingest_scan().is_err());
        assert!(dir_names(&config.thumbnails_dir).is_empty());
    }
}

#[test]
fn test_empty_run_skips_commit() {
    let (_tmp, config) = setup_gallery();
    std::fs::write(config.originals_dir.join("notes.txt"), b"not media").unwrap();

    // BrokenCatalog would fail any commit attempt
    let mut scanner = Scanner::new(config.clone(), BrokenCatalog, MediaProbe, FailingThumbnailer);
    let report = scanner.run_ingest_scan().unwrap();
    assert_eq!(report, ScanReport::default());
}

#[test]
fn test_missing_originals_dir_fails_run() {
    let tmp = TempDir::new().unwrap();
    let config = GalleryConfig::for_storage_root(tmp.path());

    let mut scanner = probe_scanner(&config);
    assert!(scanner.run_ingest_scan().is_err());
    assert!(scanner.run_discovery_scan().is_err());
}

#[test]
fn test_relative_path_helpers() {
    let root = Path::new("/srv/gallery");
    let file = root.join("originals").join("2024").join("a.png");
    assert_eq!(relative_path(root, &file).unwrap(), "originals/2024/a.png");
    assert_eq!(resolve_relative(root, "originals/2024/a.png"), file);
    assert!(relative_path(root, Path::new("/tmp/a.png")).is_err());
}
