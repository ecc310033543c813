//! Database Connection Management
//!
//! Core database connection and initialization using libsql. The schema is
//! applied through the versioned migration history in [`crate::db::migrations`]
//! at startup, so all other code can assume the full schema exists.
//!
//! # Connection Patterns
//!
//! Always use `connect_with_timeout()` in async functions. The busy timeout
//! lets concurrent operations wait and retry instead of failing immediately
//! with `SQLITE_BUSY` when the Tokio runtime interleaves handlers.
//!
//! Multi-statement mutations (tree reorders, cascade deletes, purges) run
//! explicit `BEGIN TRANSACTION` / `COMMIT` / `ROLLBACK` statements on a
//! single connection; see the service layer.

use crate::db::error::DatabaseError;
use crate::db::migrations;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use folio_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = DatabaseService::new(PathBuf::from("./data/folio.db")).await?;
///     let conn = db.connect_with_timeout().await?;
///     # let _ = conn;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Enable WAL mode, foreign keys, and the busy timeout
    /// 4. Apply any pending schema migrations
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created,
    /// the connection fails, or a migration fails to apply.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        // Only checkpoint the WAL for brand-new database files; see initialize()
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DatabaseError::DirectoryCreationFailed)?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize(is_new_database).await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of
    /// execute(). This helper encapsulates that pattern.
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Configure SQLite and bring the schema up to the latest version.
    ///
    /// Idempotent: already-applied migrations are skipped, so this is safe
    /// on every startup.
    async fn initialize(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        // WAL mode for better concurrency between handler tasks
        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        // Wait up to 5s on lock contention instead of failing immediately
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        // Referential integrity for parent pointers and join tables
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        migrations::apply_pending(&conn).await?;

        // Flush the schema to disk for fresh databases so rapid open/close
        // cycles in tests never observe "no such table".
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Get a connection to the database
    ///
    /// Multiple connections can be used concurrently thanks to WAL mode.
    /// Prefer `connect_with_timeout()` in async contexts.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with the busy timeout applied
    ///
    /// Use this in async functions: the timeout makes concurrent operations
    /// wait and retry instead of surfacing `SQLITE_BUSY` to callers.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_database_and_schema() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("folio.db");

        let db = DatabaseService::new(db_path.clone()).await.unwrap();
        assert!(db_path.exists());

        // Schema exists: a plain insert into a migrated table succeeds
        let conn = db.connect_with_timeout().await.unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('test.key', '1')",
            (),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("folio.db");

        DatabaseService::new(db_path.clone()).await.unwrap();
        // Second open must not re-run migrations or fail
        let db = DatabaseService::new(db_path).await.unwrap();

        let conn = db.connect_with_timeout().await.unwrap();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM schema_migrations", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count as usize, crate::db::migrations::all().len());
    }

    #[tokio::test]
    async fn test_default_settings_seeded() {
        let temp = TempDir::new().unwrap();
        let db = DatabaseService::new(temp.path().join("folio.db"))
            .await
            .unwrap();

        let conn = db.connect_with_timeout().await.unwrap();
        let mut rows = conn
            .query(
                "SELECT value FROM settings WHERE key = 'site.default_language'",
                (),
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let value: String = row.get(0).unwrap();
        assert_eq!(value, "en");
    }
}
