// Database module

pub mod migrations;
pub mod schema;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use anyhow::Result;

/// Open or create a database at the given path
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;

    // WAL lets readers (e.g. the web layer) keep going during a scan commit
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Open an existing database without writing to it. Fails when the file is
/// missing or its schema is not current.
pub fn open_db_read_only(db_path: &Path) -> Result<Connection> {
    if !db_path.is_file() {
        anyhow::bail!("No gallery database at {}", db_path.display());
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    migrations::ensure_current(&conn)?;

    Ok(conn)
}

/// In-memory database with all migrations applied
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_db_creates_parent() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join(".gallery").join("gallery.db");
        let conn = open_db(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(schema::count_media(&conn).unwrap(), 0);
    }

    #[test]
    fn test_read_only_requires_existing_db() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join(".gallery").join("gallery.db");
        assert!(open_db_read_only(&db_path).is_err());
        assert!(!tmp.path().join(".gallery").exists());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("gallery.db");
        drop(open_db(&db_path).unwrap());

        let conn = open_db_read_only(&db_path).unwrap();
        assert_eq!(schema::count_media(&conn).unwrap(), 0);
        assert!(conn.execute("DELETE FROM media", []).is_err());
    }

    #[test]
    fn test_read_only_rejects_stale_schema() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("old.db");
        Connection::open(&db_path).unwrap().execute_batch("PRAGMA user_version = 1").unwrap();
        assert!(open_db_read_only(&db_path).is_err());
    }
}
