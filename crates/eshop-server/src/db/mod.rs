mod migrations;

use anyhow::Context;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Opens (or creates) the SQLite database, applies the schema and hands
/// back the shared pool.
pub fn create_pool(sqlite_path: &str) -> anyhow::Result<DbPool> {
    if let Some(parent) = Path::new(sqlite_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory for {sqlite_path}"))?;
    }

    let manager = SqliteConnectionManager::file(sqlite_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(|conn| {
            // Foreign keys stay on so cart rows follow their user
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });

    let pool = Pool::builder()
        .max_size(8)
        .build(manager)
        .context("building database pool")?;

    let conn = pool
        .get()
        .context("checking out connection for migrations")?;
    migrations::run(&conn).context("applying database schema")?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_pool_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = create_pool(blocker.join("eshop.db").to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn create_pool_applies_schema() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("eshop.db").to_str().unwrap()).unwrap();

        let conn = pool.get().unwrap();
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 0);
    }
}
