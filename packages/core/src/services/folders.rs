//! Media Folder Service
//!
//! Folders form a parent-pointer tree with the same structural rules as
//! the page tree (cycle rejection, dense sibling order) but no
//! materialized paths: folders are navigational only. Files attach to
//! folders through the `media_folder_items` join table, many-to-many, and
//! the join rows deliberately survive folder soft-deletes so a restored
//! folder comes back with its contents intact.

use crate::db::DatabaseService;
use crate::models::time::{parse_timestamp, to_sqlite};
use crate::models::MediaFolder;
use crate::services::error::ServiceError;
use crate::services::tx;
use chrono::Utc;
use libsql::Connection;
use serde::Deserialize;
use std::sync::Arc;

const FOLDER_COLUMNS: &str = "id, name, parent_id, order_index, created_at, deleted_at";

/// Move request for a folder: new parent (None = top level) and clamped
/// sibling position.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderMove {
    pub new_parent_id: Option<i64>,
    #[serde(default)]
    pub new_index: i64,
}

pub struct FolderService {
    db: Arc<DatabaseService>,
}

impl FolderService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Create a folder appended at the end of its parent's children.
    pub async fn create(
        &self,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<MediaFolder, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("folder name must not be empty"));
        }

        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = create_in_tx(&conn, name, parent_id).await;
        match result {
            Ok(id) => {
                tx::commit(&conn).await?;
                self.get(id).await
            }
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// Fetch a live folder by id.
    pub async fn get(&self, id: i64) -> Result<MediaFolder, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        match fetch_folder(&conn, id).await? {
            Some(f) if f.deleted_at.is_none() => Ok(f),
            _ => Err(ServiceError::not_found("folder", id)),
        }
    }

    /// All live folders in tree order (parents before children is up to
    /// the caller; rows come back grouped by parent, siblings in order).
    pub async fn tree(&self) -> Result<Vec<MediaFolder>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {FOLDER_COLUMNS} FROM media_folders
                     WHERE deleted_at IS NULL
                     ORDER BY parent_id, order_index, id"
                ),
                (),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list folders", e))?;

        let mut folders = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch folder row", e))?
        {
            folders.push(row_to_folder(&row)?);
        }
        Ok(folders)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<MediaFolder, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("folder name must not be empty"));
        }

        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE media_folders SET name = ? WHERE id = ? AND deleted_at IS NULL",
                (name, id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to rename folder", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("folder", id));
        }
        self.get(id).await
    }

    /// Relocate a folder: cycle check, reparent, dense sibling rewrite.
    pub async fn r#move(&self, id: i64, request: FolderMove) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = move_in_tx(&conn, id, &request).await;
        match result {
            Ok(()) => tx::commit(&conn).await,
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// Soft-delete a folder and its live descendant folders with one
    /// shared timestamp. Join rows stay in place.
    pub async fn soft_delete(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = soft_delete_in_tx(&conn, id).await;
        match result {
            Ok(()) => tx::commit(&conn).await,
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// Restore a soft-deleted folder subtree (same-timestamp cascade).
    /// Falls back to top level when the old parent is deleted or gone.
    pub async fn restore(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = restore_in_tx(&conn, id).await;
        match result {
            Ok(()) => tx::commit(&conn).await,
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// All soft-deleted folders, most recently deleted first.
    pub async fn list_trash(&self) -> Result<Vec<MediaFolder>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {FOLDER_COLUMNS} FROM media_folders
                     WHERE deleted_at IS NOT NULL
                     ORDER BY deleted_at DESC, id"
                ),
                (),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list folder trash", e))?;

        let mut folders = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch folder trash row", e))?
        {
            folders.push(row_to_folder(&row)?);
        }
        Ok(folders)
    }

    /// Assign media files to a folder as one batch. Already-assigned
    /// pairs are a silent no-op; a missing file fails the whole batch.
    pub async fn assign(&self, folder_id: i64, media_ids: &[i64]) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = assign_in_tx(&conn, folder_id, media_ids).await;
        match result {
            Ok(()) => tx::commit(&conn).await,
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// Remove media files from a folder. Unassigned pairs are a no-op.
    pub async fn unassign(&self, folder_id: i64, media_ids: &[i64]) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let mut result = Ok(());
        for &media_id in media_ids {
            if let Err(e) = conn
                .execute(
                    "DELETE FROM media_folder_items WHERE folder_id = ? AND media_id = ?",
                    (folder_id, media_id),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to unassign media from folder", e))
            {
                result = Err(e);
                break;
            }
        }
        match result {
            Ok(()) => tx::commit(&conn).await,
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// Hard-delete folders soft-deleted before the retention cutoff. Join
    /// rows go with them via foreign-key cascade; the files themselves
    /// are untouched.
    pub async fn purge_expired(
        &self,
        now: chrono::DateTime<Utc>,
        retention_days: i64,
    ) -> Result<u64, ServiceError> {
        let cutoff = to_sqlite(now - chrono::Duration::days(retention_days));
        let conn = self.db.connect_with_timeout().await?;
        let purged = conn
            .execute(
                "DELETE FROM media_folders WHERE deleted_at IS NOT NULL AND deleted_at < ?",
                [cutoff.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to purge folders", e))?;
        Ok(purged)
    }
}

fn row_to_folder(row: &libsql::Row) -> Result<MediaFolder, ServiceError> {
    let read = |e| ServiceError::from_sql("Failed to read folder column", e);
    let created_at: String = row.get(4).map_err(read)?;
    let deleted_at: Option<String> = row.get(5).map_err(read)?;
    Ok(MediaFolder {
        id: row.get(0).map_err(read)?,
        name: row.get(1).map_err(read)?,
        parent_id: row.get(2).map_err(read)?,
        order_index: row.get(3).map_err(read)?,
        created_at: parse_ts(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
    })
}

fn parse_ts(s: &str) -> Result<chrono::DateTime<Utc>, ServiceError> {
    parse_timestamp(s).map_err(|e| {
        ServiceError::Database(crate::db::DatabaseError::sql_execution(e.to_string()))
    })
}

async fn fetch_folder(conn: &Connection, id: i64) -> Result<Option<MediaFolder>, ServiceError> {
    let mut rows = conn
        .query(
            &format!("SELECT {FOLDER_COLUMNS} FROM media_folders WHERE id = ?"),
            [id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch folder", e))?;

    match rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch folder row", e))?
    {
        Some(row) => Ok(Some(row_to_folder(&row)?)),
        None => Ok(None),
    }
}

async fn media_is_live(conn: &Connection, media_id: i64) -> Result<bool, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT 1 FROM media WHERE id = ? AND deleted_at IS NULL",
            [media_id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to check media", e))?;
    Ok(rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch media check row", e))?
        .is_some())
}

/// Ordered live child folder ids under a parent, optionally excluding the
/// folder being moved.
async fn live_child_ids(
    conn: &Connection,
    parent_id: Option<i64>,
    exclude: Option<i64>,
) -> Result<Vec<i64>, ServiceError> {
    let mut rows = match parent_id {
        Some(parent_id) => conn
            .query(
                "SELECT id FROM media_folders
                 WHERE parent_id = ? AND deleted_at IS NULL
                 ORDER BY order_index, id",
                [parent_id],
            )
            .await,
        None => conn
            .query(
                "SELECT id FROM media_folders
                 WHERE parent_id IS NULL AND deleted_at IS NULL
                 ORDER BY order_index, id",
                (),
            )
            .await,
    }
    .map_err(|e| ServiceError::from_sql("Failed to fetch child folders", e))?;

    let mut ids = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch child folder row", e))?
    {
        let id: i64 = row
            .get(0)
            .map_err(|e| ServiceError::from_sql("Failed to read folder id", e))?;
        if Some(id) != exclude {
            ids.push(id);
        }
    }
    Ok(ids)
}

async fn renumber(conn: &Connection, ordered_ids: &[i64]) -> Result<(), ServiceError> {
    for (position, id) in ordered_ids.iter().enumerate() {
        conn.execute(
            "UPDATE media_folders SET order_index = ? WHERE id = ?",
            (position as i64, *id),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to renumber folder", e))?;
    }
    Ok(())
}

/// Depth-first live descendant collection, root included.
async fn collect_live_subtree(conn: &Connection, root_id: i64) -> Result<Vec<i64>, ServiceError> {
    let mut result = vec![root_id];
    let mut queue = vec![root_id];
    while let Some(current) = queue.pop() {
        for child in live_child_ids(conn, Some(current), None).await? {
            result.push(child);
            queue.push(child);
        }
    }
    Ok(result)
}

async fn create_in_tx(
    conn: &Connection,
    name: &str,
    parent_id: Option<i64>,
) -> Result<i64, ServiceError> {
    if let Some(parent_id) = parent_id {
        match fetch_folder(conn, parent_id).await? {
            Some(f) if f.deleted_at.is_none() => {}
            _ => return Err(ServiceError::not_found("folder", parent_id)),
        }
    }

    let order_index = live_child_ids(conn, parent_id, None).await?.len() as i64;
    match parent_id {
        Some(parent_id) => {
            conn.execute(
                "INSERT INTO media_folders (name, parent_id, order_index) VALUES (?, ?, ?)",
                (name, parent_id, order_index),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to insert folder", e))?;
        }
        None => {
            conn.execute(
                "INSERT INTO media_folders (name, parent_id, order_index) VALUES (?, NULL, ?)",
                (name, order_index),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to insert folder", e))?;
        }
    }
    Ok(conn.last_insert_rowid())
}

async fn assign_in_tx(
    conn: &Connection,
    folder_id: i64,
    media_ids: &[i64],
) -> Result<(), ServiceError> {
    match fetch_folder(conn, folder_id).await? {
        Some(f) if f.deleted_at.is_none() => {}
        _ => return Err(ServiceError::not_found("folder", folder_id)),
    }

    for &media_id in media_ids {
        if !media_is_live(conn, media_id).await? {
            return Err(ServiceError::not_found("media", media_id));
        }
        conn.execute(
            "INSERT OR IGNORE INTO media_folder_items (folder_id, media_id) VALUES (?, ?)",
            (folder_id, media_id),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to assign media to folder", e))?;
    }
    Ok(())
}

async fn move_in_tx(
    conn: &Connection,
    id: i64,
    request: &FolderMove,
) -> Result<(), ServiceError> {
    match fetch_folder(conn, id).await? {
        Some(f) if f.deleted_at.is_none() => {}
        _ => return Err(ServiceError::not_found("folder", id)),
    }

    if let Some(new_parent_id) = request.new_parent_id {
        if new_parent_id == id {
            return Err(ServiceError::cycle(id, new_parent_id));
        }
        match fetch_folder(conn, new_parent_id).await? {
            Some(f) if f.deleted_at.is_none() => {}
            _ => return Err(ServiceError::not_found("folder", new_parent_id)),
        }
        let subtree = collect_live_subtree(conn, id).await?;
        if subtree.contains(&new_parent_id) {
            return Err(ServiceError::cycle(id, new_parent_id));
        }
    }

    match request.new_parent_id {
        Some(new_parent_id) => {
            conn.execute(
                "UPDATE media_folders SET parent_id = ? WHERE id = ?",
                (new_parent_id, id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to reassign folder parent", e))?;
        }
        None => {
            conn.execute(
                "UPDATE media_folders SET parent_id = NULL WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to reassign folder parent", e))?;
        }
    }

    let mut sibling_ids = live_child_ids(conn, request.new_parent_id, Some(id)).await?;
    let index = request.new_index.clamp(0, sibling_ids.len() as i64) as usize;
    sibling_ids.insert(index, id);
    renumber(conn, &sibling_ids).await?;

    Ok(())
}

async fn soft_delete_in_tx(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    let folder = match fetch_folder(conn, id).await? {
        Some(f) if f.deleted_at.is_none() => f,
        _ => return Err(ServiceError::not_found("folder", id)),
    };

    let timestamp = to_sqlite(Utc::now());
    let subtree = collect_live_subtree(conn, id).await?;
    for &subtree_id in &subtree {
        conn.execute(
            "UPDATE media_folders SET deleted_at = ? WHERE id = ?",
            (timestamp.as_str(), subtree_id),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to soft-delete folder", e))?;
    }

    let siblings = live_child_ids(conn, folder.parent_id, None).await?;
    renumber(conn, &siblings).await?;

    Ok(())
}

async fn restore_in_tx(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    let folder = match fetch_folder(conn, id).await? {
        Some(f) => f,
        None => return Err(ServiceError::not_found("folder", id)),
    };
    let Some(deleted_at) = folder.deleted_at else {
        return Err(ServiceError::validation(format!(
            "folder {} is not in the trash",
            id
        )));
    };
    let timestamp = to_sqlite(deleted_at);

    let target_parent = match folder.parent_id {
        Some(parent_id) => match fetch_folder(conn, parent_id).await? {
            Some(p) if p.deleted_at.is_none() => Some(parent_id),
            _ => None,
        },
        None => None,
    };
    let order_index = live_child_ids(conn, target_parent, None).await?.len() as i64;

    match target_parent {
        Some(parent_id) => {
            conn.execute(
                "UPDATE media_folders SET deleted_at = NULL, parent_id = ?, order_index = ?
                 WHERE id = ?",
                (parent_id, order_index, id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore folder", e))?;
        }
        None => {
            conn.execute(
                "UPDATE media_folders SET deleted_at = NULL, parent_id = NULL, order_index = ?
                 WHERE id = ?",
                (order_index, id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore folder", e))?;
        }
    }

    // Revive descendants deleted in the same cascade
    let mut queue = vec![id];
    while let Some(current) = queue.pop() {
        let mut rows = conn
            .query(
                "SELECT id FROM media_folders WHERE parent_id = ? AND deleted_at = ?",
                (current, timestamp.as_str()),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch deleted child folders", e))?;

        let mut children = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch deleted folder row", e))?
        {
            let child: i64 = row
                .get(0)
                .map_err(|e| ServiceError::from_sql("Failed to read folder id", e))?;
            children.push(child);
        }

        for child in children {
            conn.execute(
                "UPDATE media_folders SET deleted_at = NULL WHERE id = ?",
                [child],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore descendant folder", e))?;
            queue.push(child);
        }
    }

    Ok(())
}
