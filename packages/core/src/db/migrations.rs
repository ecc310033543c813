//! Versioned Schema Migrations
//!
//! The schema is managed as an explicit, ordered migration history applied
//! at startup. Runtime code never probes for optional columns or tables;
//! after `apply_pending` returns, the full schema at the latest version is
//! guaranteed to exist.
//!
//! Each migration is a numbered list of statements executed inside one
//! transaction together with its `schema_migrations` bookkeeping row, so a
//! partially applied migration is never recorded.

use crate::db::error::DatabaseError;
use libsql::Connection;
use tracing::info;

/// A single schema migration: an ordered batch of DDL/DML statements.
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

/// The full migration history, oldest first.
///
/// Append-only: released versions are never edited, new changes get a new
/// version number.
pub fn all() -> &'static [Migration] {
    &[
        Migration {
            version: 1,
            name: "core-schema",
            statements: &[
                "CREATE TABLE nodes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind TEXT NOT NULL CHECK (kind IN ('page', 'category')),
                    parent_id INTEGER,
                    order_index INTEGER NOT NULL DEFAULT 0,
                    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    deleted_at DATETIME,
                    FOREIGN KEY (parent_id) REFERENCES nodes(id) ON DELETE CASCADE
                )",
                "CREATE TABLE node_translations (
                    node_id INTEGER NOT NULL,
                    language TEXT NOT NULL,
                    title TEXT NOT NULL,
                    slug TEXT NOT NULL,
                    full_path TEXT,
                    body TEXT,
                    seo_title TEXT,
                    seo_description TEXT,
                    PRIMARY KEY (node_id, language),
                    FOREIGN KEY (node_id) REFERENCES nodes(id) ON DELETE CASCADE
                )",
                "CREATE TABLE posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    author_id INTEGER,
                    status TEXT NOT NULL DEFAULT 'draft'
                        CHECK (status IN ('draft', 'scheduled', 'published')),
                    publish_at DATETIME,
                    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    deleted_at DATETIME
                )",
                "CREATE TABLE post_translations (
                    post_id INTEGER NOT NULL,
                    language TEXT NOT NULL,
                    title TEXT NOT NULL,
                    slug TEXT NOT NULL,
                    body TEXT,
                    seo_title TEXT,
                    seo_description TEXT,
                    PRIMARY KEY (post_id, language),
                    UNIQUE (language, slug),
                    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
                )",
                "CREATE TABLE tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    slug TEXT NOT NULL UNIQUE
                )",
                "CREATE TABLE post_tags (
                    post_id INTEGER NOT NULL,
                    tag_id INTEGER NOT NULL,
                    PRIMARY KEY (post_id, tag_id),
                    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
                )",
                "CREATE TABLE media (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    filename TEXT NOT NULL,
                    original_name TEXT NOT NULL,
                    url TEXT NOT NULL,
                    mime_type TEXT NOT NULL,
                    size_bytes INTEGER NOT NULL DEFAULT 0,
                    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    deleted_at DATETIME
                )",
                "CREATE TABLE media_folders (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    parent_id INTEGER,
                    order_index INTEGER NOT NULL DEFAULT 0,
                    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    deleted_at DATETIME,
                    FOREIGN KEY (parent_id) REFERENCES media_folders(id) ON DELETE CASCADE
                )",
                "CREATE TABLE media_folder_items (
                    folder_id INTEGER NOT NULL,
                    media_id INTEGER NOT NULL,
                    PRIMARY KEY (folder_id, media_id),
                    FOREIGN KEY (folder_id) REFERENCES media_folders(id) ON DELETE CASCADE,
                    FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE
                )",
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'editor'
                        CHECK (role IN ('admin', 'editor')),
                    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    deleted_at DATETIME
                )",
                "CREATE TABLE settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )",
            ],
        },
        Migration {
            version: 2,
            name: "core-indexes",
            statements: &[
                "CREATE INDEX idx_nodes_parent ON nodes(parent_id)",
                "CREATE INDEX idx_nodes_kind ON nodes(kind)",
                "CREATE INDEX idx_nodes_deleted ON nodes(deleted_at)",
                "CREATE INDEX idx_node_translations_path ON node_translations(language, full_path)",
                "CREATE INDEX idx_posts_status ON posts(status, publish_at)",
                "CREATE INDEX idx_posts_deleted ON posts(deleted_at)",
                "CREATE INDEX idx_media_mime ON media(mime_type)",
                "CREATE INDEX idx_media_created ON media(created_at)",
                "CREATE INDEX idx_media_deleted ON media(deleted_at)",
                "CREATE INDEX idx_media_folders_parent ON media_folders(parent_id)",
                "CREATE INDEX idx_folder_items_media ON media_folder_items(media_id)",
            ],
        },
        Migration {
            version: 3,
            name: "default-settings",
            statements: &[
                "INSERT OR IGNORE INTO settings (key, value) VALUES ('site.default_language', 'en')",
                "INSERT OR IGNORE INTO settings (key, value) VALUES ('trash.retention_days', '30')",
                "INSERT OR IGNORE INTO settings (key, value) VALUES ('scheduler.tick_seconds', '60')",
            ],
        },
    ]
}

/// Apply all migrations newer than the recorded schema version.
///
/// Returns the number of migrations applied. Safe to call on every
/// startup; already-applied versions are skipped.
pub async fn apply_pending(conn: &Connection) -> Result<usize, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )
    .await
    .map_err(|e| {
        DatabaseError::sql_execution(format!("Failed to create schema_migrations table: {}", e))
    })?;

    let current = current_version(conn).await?;
    let mut applied = 0usize;

    for migration in all() {
        if migration.version <= current {
            continue;
        }
        apply_one(conn, migration).await?;
        info!(
            version = migration.version,
            name = migration.name,
            "Applied schema migration"
        );
        applied += 1;
    }

    Ok(applied)
}

/// Highest recorded migration version, or 0 for a fresh database.
async fn current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", ())
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to read schema version: {}", e))
        })?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        .ok_or_else(|| DatabaseError::sql_execution("schema version query returned no rows"))?;

    row.get::<i64>(0)
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to parse schema version: {}", e)))
}

/// Run one migration and its bookkeeping row inside a single transaction.
async fn apply_one(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
        DatabaseError::migration_failed(migration.version, migration.name, e.to_string())
    })?;

    for statement in migration.statements {
        if let Err(e) = conn.execute(statement, ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::migration_failed(
                migration.version,
                migration.name,
                e.to_string(),
            ));
        }
    }

    if let Err(e) = conn
        .execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?, ?)",
            (migration.version, migration.name),
        )
        .await
    {
        let _rollback = conn.execute("ROLLBACK", ()).await;
        return Err(DatabaseError::migration_failed(
            migration.version,
            migration.name,
            e.to_string(),
        ));
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        let _rollback = conn.execute("ROLLBACK", ()).await;
        return Err(DatabaseError::migration_failed(
            migration.version,
            migration.name,
            e.to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_strictly_increasing() {
        let migrations = all();
        for pair in migrations.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn test_no_empty_migrations() {
        for migration in all() {
            assert!(!migration.statements.is_empty());
        }
    }
}
