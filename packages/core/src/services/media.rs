//! Media Library Service
//!
//! Registration and filtered listing of uploaded files. Listing combines
//! four independent filters (folder scope, text search, MIME group,
//! live/deleted) into one dynamically built WHERE clause, runs a COUNT
//! over the same filters, and pages with LIMIT/OFFSET under a fixed sort
//! key. Every sort ends in an id tie-break, so pagination is stable.

use crate::db::DatabaseService;
use crate::models::time::{parse_timestamp, to_sqlite};
use crate::models::{FolderFilter, MediaItem, MediaPage, MediaQuery, MimeGroup};
use crate::services::error::ServiceError;
use chrono::Utc;
use libsql::{params_from_iter, Connection, Value};
use serde::Deserialize;
use std::sync::Arc;

const MEDIA_COLUMNS: &str =
    "m.id, m.filename, m.original_name, m.url, m.mime_type, m.size_bytes, m.created_at, m.deleted_at";

/// Registration input for an uploaded file. Storage itself happens
/// upstream; this service only records the catalog row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

pub struct MediaService {
    db: Arc<DatabaseService>,
}

impl MediaService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Record an uploaded file in the catalog.
    pub async fn register(&self, input: NewMedia) -> Result<MediaItem, ServiceError> {
        if input.filename.trim().is_empty() {
            return Err(ServiceError::validation("filename must not be empty"));
        }
        if input.mime_type.trim().is_empty() {
            return Err(ServiceError::validation("mime type must not be empty"));
        }
        if input.size_bytes < 0 {
            return Err(ServiceError::validation("size must not be negative"));
        }

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO media (filename, original_name, url, mime_type, size_bytes)
             VALUES (?, ?, ?, ?, ?)",
            (
                input.filename.as_str(),
                input.original_name.as_str(),
                input.url.as_str(),
                input.mime_type.as_str(),
                input.size_bytes,
            ),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to register media", e))?;

        self.get(conn.last_insert_rowid()).await
    }

    /// Fetch a live media item.
    pub async fn get(&self, id: i64) -> Result<MediaItem, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        match fetch_media(&conn, id).await? {
            Some(m) if m.deleted_at.is_none() => Ok(m),
            _ => Err(ServiceError::not_found("media", id)),
        }
    }

    /// Filtered, sorted, paginated listing with a total match count.
    pub async fn list(&self, query: &MediaQuery) -> Result<MediaPage, ServiceError> {
        let (where_clause, values) = build_filters(query);
        let conn = self.db.connect_with_timeout().await?;

        let count_sql = format!("SELECT COUNT(*) FROM media m WHERE {where_clause}");
        let mut rows = conn
            .query(&count_sql, params_from_iter(values.clone()))
            .await
            .map_err(|e| ServiceError::from_sql("Failed to count media", e))?;
        let total: i64 = match rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch media count", e))?
        {
            Some(row) => row
                .get(0)
                .map_err(|e| ServiceError::from_sql("Failed to read media count", e))?,
            None => 0,
        };

        let page = query.effective_page();
        let page_size = query.effective_page_size();
        let offset = i64::from(page - 1) * i64::from(page_size);

        let list_sql = format!(
            "SELECT {MEDIA_COLUMNS} FROM media m WHERE {where_clause} {} LIMIT ? OFFSET ?",
            query.sort.order_clause()
        );
        let mut list_values = values;
        list_values.push(Value::from(i64::from(page_size)));
        list_values.push(Value::from(offset));

        let mut rows = conn
            .query(&list_sql, params_from_iter(list_values))
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list media", e))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch media row", e))?
        {
            items.push(row_to_media(&row)?);
        }

        Ok(MediaPage {
            items,
            total: total.max(0) as u64,
            page,
            page_size,
        })
    }

    /// Update the display name of a live media item.
    pub async fn rename(&self, id: i64, original_name: &str) -> Result<MediaItem, ServiceError> {
        let original_name = original_name.trim();
        if original_name.is_empty() {
            return Err(ServiceError::validation("name must not be empty"));
        }

        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE media SET original_name = ? WHERE id = ? AND deleted_at IS NULL",
                (original_name, id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to rename media", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("media", id));
        }
        self.get(id).await
    }

    /// Soft-delete a media item. Folder assignments stay in place.
    pub async fn soft_delete(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE media SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
                (to_sqlite(Utc::now()).as_str(), id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to soft-delete media", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("media", id));
        }
        Ok(())
    }

    /// Bring a media item back from the trash.
    pub async fn restore(&self, id: i64) -> Result<MediaItem, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE media SET deleted_at = NULL WHERE id = ? AND deleted_at IS NOT NULL",
                [id],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore media", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("media", id));
        }
        self.get(id).await
    }

    /// All soft-deleted media, most recently deleted first.
    pub async fn list_trash(&self) -> Result<Vec<MediaItem>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {MEDIA_COLUMNS} FROM media m
                     WHERE m.deleted_at IS NOT NULL
                     ORDER BY m.deleted_at DESC, m.id"
                ),
                (),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list media trash", e))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch media trash row", e))?
        {
            items.push(row_to_media(&row)?);
        }
        Ok(items)
    }

    /// Hard-delete media soft-deleted before the retention cutoff.
    pub async fn purge_expired(
        &self,
        now: chrono::DateTime<Utc>,
        retention_days: i64,
    ) -> Result<u64, ServiceError> {
        let cutoff = to_sqlite(now - chrono::Duration::days(retention_days));
        let conn = self.db.connect_with_timeout().await?;
        let purged = conn
            .execute(
                "DELETE FROM media WHERE deleted_at IS NOT NULL AND deleted_at < ?",
                [cutoff.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to purge media", e))?;
        Ok(purged)
    }
}

/// Assemble the WHERE clause and bind values for a media query.
///
/// Kept free of connection state so filter composition is testable on its
/// own.
fn build_filters(query: &MediaQuery) -> (String, Vec<Value>) {
    let mut clauses = vec!["m.deleted_at IS NULL".to_string()];
    let mut values: Vec<Value> = Vec::new();

    match query.folder {
        FolderFilter::All => {}
        FolderFilter::Unassigned => {
            clauses.push(
                "NOT EXISTS (SELECT 1 FROM media_folder_items i WHERE i.media_id = m.id)"
                    .to_string(),
            );
        }
        FolderFilter::Folder(folder_id) => {
            clauses.push(
                "EXISTS (SELECT 1 FROM media_folder_items i
                         WHERE i.media_id = m.id AND i.folder_id = ?)"
                    .to_string(),
            );
            values.push(Value::from(folder_id));
        }
    }

    if let Some(text) = query.text.as_deref() {
        let text = text.trim();
        if !text.is_empty() {
            let pattern = like_pattern(text);
            clauses.push(
                "(LOWER(m.filename) LIKE ? ESCAPE '\\'
                  OR LOWER(m.original_name) LIKE ? ESCAPE '\\'
                  OR LOWER(m.url) LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            values.push(Value::from(pattern.clone()));
            values.push(Value::from(pattern.clone()));
            values.push(Value::from(pattern));
        }
    }

    match query.mime_group {
        None => {}
        Some(MimeGroup::Image) => {
            clauses.push("m.mime_type LIKE 'image/%'".to_string());
        }
        Some(MimeGroup::Video) => {
            clauses.push("m.mime_type LIKE 'video/%'".to_string());
        }
        Some(MimeGroup::Doc) => {
            clauses.push(
                "(m.mime_type LIKE 'application/%' OR m.mime_type LIKE 'text/%')".to_string(),
            );
        }
    }

    (clauses.join(" AND "), values)
}

/// Lowercased contains-pattern with LIKE metacharacters escaped.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.to_lowercase().chars() {
        if c == '%' || c == '_' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn row_to_media(row: &libsql::Row) -> Result<MediaItem, ServiceError> {
    let read = |e| ServiceError::from_sql("Failed to read media column", e);
    let created_at: String = row.get(6).map_err(read)?;
    let deleted_at: Option<String> = row.get(7).map_err(read)?;
    Ok(MediaItem {
        id: row.get(0).map_err(read)?,
        filename: row.get(1).map_err(read)?,
        original_name: row.get(2).map_err(read)?,
        url: row.get(3).map_err(read)?,
        mime_type: row.get(4).map_err(read)?,
        size_bytes: row.get(5).map_err(read)?,
        created_at: parse_ts(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
    })
}

fn parse_ts(s: &str) -> Result<chrono::DateTime<Utc>, ServiceError> {
    parse_timestamp(s).map_err(|e| {
        ServiceError::Database(crate::db::DatabaseError::sql_execution(e.to_string()))
    })
}

async fn fetch_media(conn: &Connection, id: i64) -> Result<Option<MediaItem>, ServiceError> {
    let mut rows = conn
        .query(
            &format!("SELECT {MEDIA_COLUMNS} FROM media m WHERE m.id = ?"),
            [id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch media", e))?;

    match rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch media row", e))?
    {
        Some(row) => Ok(Some(row_to_media(&row)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaSort;

    #[test]
    fn test_default_query_filters_only_deleted() {
        let (clause, values) = build_filters(&MediaQuery::default());
        assert_eq!(clause, "m.deleted_at IS NULL");
        assert!(values.is_empty());
    }

    #[test]
    fn test_folder_filter_binds_id() {
        let query = MediaQuery {
            folder: FolderFilter::Folder(7),
            ..Default::default()
        };
        let (clause, values) = build_filters(&query);
        assert!(clause.contains("i.folder_id = ?"));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_unassigned_filter_uses_not_exists() {
        let query = MediaQuery {
            folder: FolderFilter::Unassigned,
            ..Default::default()
        };
        let (clause, values) = build_filters(&query);
        assert!(clause.contains("NOT EXISTS"));
        assert!(values.is_empty());
    }

    #[test]
    fn test_text_filter_binds_three_patterns() {
        let query = MediaQuery {
            text: Some("Logo".to_string()),
            ..Default::default()
        };
        let (clause, values) = build_filters(&query);
        assert!(clause.contains("LOWER(m.filename) LIKE ?"));
        assert_eq!(values.len(), 3);
        for value in values {
            assert_eq!(value, Value::from("%logo%".to_string()));
        }
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let query = MediaQuery {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        let (clause, values) = build_filters(&query);
        assert_eq!(clause, "m.deleted_at IS NULL");
        assert!(values.is_empty());
    }

    #[test]
    fn test_doc_group_matches_application_and_text() {
        let query = MediaQuery {
            mime_group: Some(MimeGroup::Doc),
            ..Default::default()
        };
        let (clause, _) = build_filters(&query);
        assert!(clause.contains("LIKE 'application/%'"));
        assert!(clause.contains("LIKE 'text/%'"));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("A\\B"), "%a\\\\b%");
    }

    #[test]
    fn test_combined_filters_stack() {
        let query = MediaQuery {
            folder: FolderFilter::Folder(3),
            text: Some("report".to_string()),
            mime_group: Some(MimeGroup::Image),
            sort: MediaSort::SizeDesc,
            page: 2,
            page_size: 10,
        };
        let (clause, values) = build_filters(&query);
        assert!(clause.starts_with("m.deleted_at IS NULL AND "));
        assert!(clause.contains("EXISTS"));
        assert!(clause.contains("LIKE 'image/%'"));
        assert_eq!(values.len(), 4);
    }
}
