// Catalog: the durable store the scanner deduplicates against and appends to

use std::collections::HashSet;
use std::path::Path;
use rusqlite::Connection;

use crate::db::schema::{self, MediaRecord, NewMediaRecord, TrackedRecord};
use crate::error::Result;

pub trait Catalog {
    /// Every content hash currently recorded
    fn list_all_hashes(&self) -> Result<HashSet<String>>;

    /// Identity columns of every record, for discovery's three-way matching
    fn list_records_for_tracking(&self) -> Result<Vec<TrackedRecord>>;

    /// Commit a batch atomically. Returns the number of records written.
    fn insert_batch(&mut self, records: &[NewMediaRecord]) -> Result<usize>;
}

/// Catalog backed by the gallery's SQLite database
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (and migrate) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(crate::db::open_db(db_path)?))
    }

    /// Open an existing database without creating or migrating it
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        Ok(Self::new(crate::db::open_db_read_only(db_path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(crate::db::open_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn list_media(&self, limit: i64, offset: i64) -> Result<Vec<MediaRecord>> {
        schema::list_media(&self.conn, limit, offset)
    }

    pub fn count_media(&self) -> Result<i64> {
        schema::count_media(&self.conn)
    }
}

impl Catalog for SqliteCatalog {
    fn list_all_hashes(&self) -> Result<HashSet<String>> {
        Ok(schema::list_media_hashes(&self.conn)?.into_iter().collect())
    }

    fn list_records_for_tracking(&self) -> Result<Vec<TrackedRecord>> {
        schema::list_tracked_records(&self.conn)
    }

    fn insert_batch(&mut self, records: &[NewMediaRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        Ok(schema::insert_media_batch(&self.conn, records)?.len())
    }
}
