// Database schema types and query helpers

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use crate::error::{GalleryError, Result};
use crate::metadata::MediaKind;

impl ToSql for MediaKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MediaKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        MediaKind::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown file_type '{}'", s).into()))
    }
}

// ----- Media -----

/// A committed catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: i64,
    pub hash: String,
    pub filename: String,
    pub path: String,
    pub thumbnail_path: Option<String>,
    pub file_type: MediaKind,
    pub mime_type: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<f64>,
    pub original_path: Option<String>,
    pub created_at: String,
}

/// A record staged by the scanner, not yet committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMediaRecord {
    pub hash: String,
    pub filename: String,
    pub path: String,
    pub thumbnail_path: Option<String>,
    pub file_type: MediaKind,
    pub mime_type: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<f64>,
    pub original_path: Option<String>,
    pub created_at: String,
}

/// The identity columns discovery needs to decide "already tracked"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedRecord {
    pub hash: String,
    pub filename: String,
    pub path: String,
    pub original_path: Option<String>,
}

const MEDIA_COLUMNS: &str = "id, hash, filename, path, thumbnail_path, file_type, mime_type, file_size,
    width, height, duration, original_path, created_at";

fn map_media(row: &rusqlite::Row) -> rusqlite::Result<MediaRecord> {
    Ok(MediaRecord {
        id: row.get(0)?,
        hash: row.get(1)?,
        filename: row.get(2)?,
        path: row.get(3)?,
        thumbnail_path: row.get(4)?,
        file_type: row.get(5)?,
        mime_type: row.get(6)?,
        file_size: row.get(7)?,
        width: row.get(8)?,
        height: row.get(9)?,
        duration: row.get(10)?,
        original_path: row.get(11)?,
        created_at: row.get(12)?,
    })
}

pub fn insert_media(conn: &Connection, media: &NewMediaRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO media (hash, filename, path, thumbnail_path, file_type, mime_type, file_size,
                            width, height, duration, original_path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            media.hash,
            media.filename,
            media.path,
            media.thumbnail_path,
            media.file_type,
            media.mime_type,
            media.file_size,
            media.width,
            media.height,
            media.duration,
            media.original_path,
            media.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert all records in one transaction. Any failure rolls back the whole
/// batch and is reported as a commit error.
pub fn insert_media_batch(conn: &Connection, records: &[NewMediaRecord]) -> Result<Vec<i64>> {
    let tx = conn.unchecked_transaction()
        .map_err(|e| GalleryError::CatalogCommit(format!("Cannot begin transaction: {}", e)))?;

    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        let id = insert_media(&tx, record).map_err(|e| {
            GalleryError::CatalogCommit(format!("Insert of {} failed: {}", record.filename, e))
        })?;
        ids.push(id);
    }

    tx.commit()
        .map_err(|e| GalleryError::CatalogCommit(format!("Commit failed: {}", e)))?;
    Ok(ids)
}

pub fn list_media_hashes(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT hash FROM media")?;
    let hashes = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(hashes)
}

pub fn list_tracked_records(conn: &Connection) -> Result<Vec<TrackedRecord>> {
    let mut stmt = conn.prepare("SELECT hash, filename, path, original_path FROM media")?;
    let records = stmt
        .query_map([], |row| {
            Ok(TrackedRecord {
                hash: row.get(0)?,
                filename: row.get(1)?,
                path: row.get(2)?,
                original_path: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

pub fn list_media(conn: &Connection, limit: i64, offset: i64) -> Result<Vec<MediaRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM media ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        MEDIA_COLUMNS
    ))?;
    let media = stmt
        .query_map(params![limit, offset], map_media)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(media)
}

pub fn count_media(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?;
    Ok(count)
}
