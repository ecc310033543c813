//! Post Service
//!
//! Flat (non-hierarchical) content with per-language translations, a
//! draft/scheduled/published lifecycle, and tag assignment. Post slugs
//! are unique per language across all posts; the schema enforces it and
//! violations surface as conflicts.

use crate::db::DatabaseService;
use crate::models::time::{parse_timestamp, to_sqlite};
use crate::models::{Post, PostStatus, PostTranslation, Tag};
use crate::services::error::ServiceError;
use crate::services::sanitize::HtmlSanitizer;
use crate::services::tx;
use crate::utils::slugify;
use chrono::{DateTime, Utc};
use libsql::Connection;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const POST_COLUMNS: &str =
    "id, author_id, status, publish_at, created_at, updated_at, deleted_at";

/// Input for creating a post with its first translation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub author_id: Option<i64>,
    pub language: String,
    pub title: String,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// Partial update of one post translation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTranslationUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// A post with its translations and tags.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub translations: Vec<PostTranslation>,
    pub tags: Vec<Tag>,
}

pub struct PostService {
    db: Arc<DatabaseService>,
    sanitizer: Arc<dyn HtmlSanitizer>,
}

impl PostService {
    pub fn new(db: Arc<DatabaseService>, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        Self { db, sanitizer }
    }

    /// Create a draft post with its first translation.
    pub async fn create(&self, input: NewPost) -> Result<PostDetail, ServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }
        if input.language.trim().is_empty() {
            return Err(ServiceError::validation("language must not be empty"));
        }

        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = self.create_in_tx(&conn, &input, &title).await;
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

    async fn create_in_tx(
        &self,
        conn: &Connection,
        input: &NewPost,
        title: &str,
    ) -> Result<i64, ServiceError> {
        match input.author_id {
            Some(author_id) => {
                conn.execute(
                    "INSERT INTO posts (author_id, status) VALUES (?, 'draft')",
                    [author_id],
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to insert post", e))?;
            }
            None => {
                conn.execute(
                    "INSERT INTO posts (author_id, status) VALUES (NULL, 'draft')",
                    (),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to insert post", e))?;
            }
        }
        let id = conn.last_insert_rowid();

        let slug = derive_slug(input.slug.as_deref(), title);
        let body = input.body.as_deref().map(|b| self.sanitizer.sanitize(b));

        conn.execute(
            "INSERT INTO post_translations
                (post_id, language, title, slug, body, seo_title, seo_description)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id,
                input.language.as_str(),
                title,
                slug.as_str(),
                body.as_deref(),
                input.seo_title.as_deref(),
                input.seo_description.as_deref(),
            ),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to insert post translation", e))?;

        Ok(id)
    }

    /// Fetch a live post with translations and tags.
    pub async fn get(&self, id: i64) -> Result<PostDetail, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let post = match fetch_post(&conn, id).await? {
            Some(p) if p.deleted_at.is_none() => p,
            _ => return Err(ServiceError::not_found("post", id)),
        };
        let translations = fetch_post_translations(&conn, id).await?;
        let tags = fetch_post_tags(&conn, id).await?;
        Ok(PostDetail {
            post,
            translations,
            tags,
        })
    }

    /// All live posts, newest first.
    pub async fn list(&self) -> Result<Vec<Post>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts
                     WHERE deleted_at IS NULL
                     ORDER BY created_at DESC, id DESC"
                ),
                (),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list posts", e))?;

        let mut posts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch post row", e))?
        {
            posts.push(row_to_post(&row)?);
        }
        Ok(posts)
    }

    /// Create or update one translation. A duplicate slug in the same
    /// language is rejected as a conflict by the schema.
    pub async fn update_translation(
        &self,
        post_id: i64,
        language: &str,
        update: PostTranslationUpdate,
    ) -> Result<PostDetail, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        match fetch_post(&conn, post_id).await? {
            Some(p) if p.deleted_at.is_none() => {}
            _ => return Err(ServiceError::not_found("post", post_id)),
        }

        let existing = fetch_post_translation(&conn, post_id, language).await?;

        let title = match (&update.title, &existing) {
            (Some(t), _) => t.trim().to_string(),
            (None, Some(t)) => t.title.clone(),
            (None, None) => {
                return Err(ServiceError::validation(
                    "title is required for a new translation",
                ))
            }
        };
        if title.is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }

        let slug = match (&update.slug, &existing) {
            (Some(explicit), _) => derive_slug(Some(explicit), &title),
            (None, Some(t)) => t.slug.clone(),
            (None, None) => derive_slug(None, &title),
        };

        let body = match &update.body {
            Some(b) => Some(self.sanitizer.sanitize(b)),
            None => existing.as_ref().and_then(|t| t.body.clone()),
        };
        let seo_title = update
            .seo_title
            .clone()
            .or_else(|| existing.as_ref().and_then(|t| t.seo_title.clone()));
        let seo_description = update
            .seo_description
            .clone()
            .or_else(|| existing.as_ref().and_then(|t| t.seo_description.clone()));

        conn.execute(
            "INSERT INTO post_translations
                (post_id, language, title, slug, body, seo_title, seo_description)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (post_id, language) DO UPDATE SET
                title = excluded.title,
                slug = excluded.slug,
                body = excluded.body,
                seo_title = excluded.seo_title,
                seo_description = excluded.seo_description",
            (
                post_id,
                language,
                title.as_str(),
                slug.as_str(),
                body.as_deref(),
                seo_title.as_deref(),
                seo_description.as_deref(),
            ),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to upsert post translation", e))?;

        touch(&conn, post_id).await?;
        self.get(post_id).await
    }

    /// Move a post through its lifecycle. Scheduling requires a publish
    /// timestamp; every other status clears any schedule.
    pub async fn set_status(
        &self,
        post_id: i64,
        status: PostStatus,
        publish_at: Option<DateTime<Utc>>,
    ) -> Result<PostDetail, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        match fetch_post(&conn, post_id).await? {
            Some(p) if p.deleted_at.is_none() => {}
            _ => return Err(ServiceError::not_found("post", post_id)),
        }

        match (status, publish_at) {
            (PostStatus::Scheduled, Some(at)) => {
                conn.execute(
                    "UPDATE posts SET status = 'scheduled', publish_at = ?,
                            updated_at = CURRENT_TIMESTAMP
                     WHERE id = ?",
                    (to_sqlite(at), post_id),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to schedule post", e))?;
            }
            (PostStatus::Scheduled, None) => {
                return Err(ServiceError::validation(
                    "scheduling a post requires a publish time",
                ));
            }
            (status, _) => {
                conn.execute(
                    "UPDATE posts SET status = ?, publish_at = NULL,
                            updated_at = CURRENT_TIMESTAMP
                     WHERE id = ?",
                    (status.as_str(), post_id),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to update post status", e))?;
            }
        }

        self.get(post_id).await
    }

    /// Flip every scheduled post whose publish time has arrived to
    /// published. Returns the ids that changed.
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<i64>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let cutoff = to_sqlite(now);

        let mut rows = conn
            .query(
                "SELECT id FROM posts
                 WHERE status = 'scheduled' AND deleted_at IS NULL
                   AND publish_at IS NOT NULL AND publish_at <= ?
                 ORDER BY id",
                [cutoff.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to find due posts", e))?;

        let mut due = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch due post row", e))?
        {
            let id: i64 = row
                .get(0)
                .map_err(|e| ServiceError::from_sql("Failed to read post id", e))?;
            due.push(id);
        }

        for &id in &due {
            conn.execute(
                "UPDATE posts SET status = 'published', updated_at = CURRENT_TIMESTAMP
                 WHERE id = ? AND status = 'scheduled'",
                [id],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to publish post", e))?;
            info!(post_id = id, "Published scheduled post");
        }

        Ok(due)
    }

    /// Attach tags by id. Already-attached tags are a no-op.
    pub async fn add_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        match fetch_post(&conn, post_id).await? {
            Some(p) if p.deleted_at.is_none() => {}
            _ => return Err(ServiceError::not_found("post", post_id)),
        }

        for &tag_id in tag_ids {
            if !tag_exists(&conn, tag_id).await? {
                return Err(ServiceError::not_found("tag", tag_id));
            }
            conn.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)",
                (post_id, tag_id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to attach tag", e))?;
        }
        Ok(())
    }

    /// Detach tags by id. Unattached tags are a no-op.
    pub async fn remove_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        for &tag_id in tag_ids {
            conn.execute(
                "DELETE FROM post_tags WHERE post_id = ? AND tag_id = ?",
                (post_id, tag_id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to detach tag", e))?;
        }
        Ok(())
    }

    pub async fn soft_delete(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE posts SET deleted_at = ?, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ? AND deleted_at IS NULL",
                (to_sqlite(Utc::now()).as_str(), id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to soft-delete post", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("post", id));
        }
        Ok(())
    }

    pub async fn restore(&self, id: i64) -> Result<PostDetail, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE posts SET deleted_at = NULL, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ? AND deleted_at IS NOT NULL",
                [id],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore post", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("post", id));
        }
        self.get(id).await
    }

    /// All soft-deleted posts, most recently deleted first.
    pub async fn list_trash(&self) -> Result<Vec<Post>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts
                     WHERE deleted_at IS NOT NULL
                     ORDER BY deleted_at DESC, id"
                ),
                (),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list post trash", e))?;

        let mut posts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch post trash row", e))?
        {
            posts.push(row_to_post(&row)?);
        }
        Ok(posts)
    }

    /// Hard-delete posts soft-deleted before the retention cutoff.
    pub async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<u64, ServiceError> {
        let cutoff = to_sqlite(now - chrono::Duration::days(retention_days));
        let conn = self.db.connect_with_timeout().await?;
        let purged = conn
            .execute(
                "DELETE FROM posts WHERE deleted_at IS NOT NULL AND deleted_at < ?",
                [cutoff.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to purge posts", e))?;
        Ok(purged)
    }
}

/// Tag catalog management, separate from post assignment.
pub struct TagService {
    db: Arc<DatabaseService>,
}

impl TagService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: &str, slug: Option<&str>) -> Result<Tag, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("tag name must not be empty"));
        }
        let slug = derive_slug(slug, name);

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO tags (name, slug) VALUES (?, ?)",
            (name, slug.as_str()),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to insert tag", e))?;

        let id = conn.last_insert_rowid();
        Ok(Tag {
            id,
            name: name.to_string(),
            slug,
        })
    }

    pub async fn list(&self) -> Result<Vec<Tag>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT id, name, slug FROM tags ORDER BY name, id", ())
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list tags", e))?;

        let mut tags = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch tag row", e))?
        {
            tags.push(row_to_tag(&row)?);
        }
        Ok(tags)
    }

    /// Rename a tag. The slug is left alone unless explicitly replaced.
    pub async fn rename(
        &self,
        id: i64,
        name: &str,
        slug: Option<&str>,
    ) -> Result<Tag, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("tag name must not be empty"));
        }

        let conn = self.db.connect_with_timeout().await?;
        let updated = match slug {
            Some(explicit) => {
                let slug = derive_slug(Some(explicit), name);
                conn.execute(
                    "UPDATE tags SET name = ?, slug = ? WHERE id = ?",
                    (name, slug.as_str(), id),
                )
                .await
            }
            None => {
                conn.execute("UPDATE tags SET name = ? WHERE id = ?", (name, id))
                    .await
            }
        }
        .map_err(|e| ServiceError::from_sql("Failed to rename tag", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("tag", id));
        }

        let mut rows = conn
            .query("SELECT id, name, slug FROM tags WHERE id = ?", [id])
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch tag", e))?;
        match rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch tag row", e))?
        {
            Some(row) => row_to_tag(&row),
            None => Err(ServiceError::not_found("tag", id)),
        }
    }

    /// Delete a tag. Assignments disappear via foreign-key cascade.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let deleted = conn
            .execute("DELETE FROM tags WHERE id = ?", [id])
            .await
            .map_err(|e| ServiceError::from_sql("Failed to delete tag", e))?;
        if deleted == 0 {
            return Err(ServiceError::not_found("tag", id));
        }
        Ok(())
    }
}

fn derive_slug(explicit: Option<&str>, title: &str) -> String {
    let candidate = match explicit {
        Some(s) if !s.trim().is_empty() => slugify(s),
        _ => slugify(title),
    };
    if candidate.is_empty() {
        "untitled".to_string()
    } else {
        candidate
    }
}

fn row_to_post(row: &libsql::Row) -> Result<Post, ServiceError> {
    let read = |e| ServiceError::from_sql("Failed to read post column", e);
    let status_str: String = row.get(2).map_err(read)?;
    let publish_at: Option<String> = row.get(3).map_err(read)?;
    let created_at: String = row.get(4).map_err(read)?;
    let updated_at: String = row.get(5).map_err(read)?;
    let deleted_at: Option<String> = row.get(6).map_err(read)?;

    let status = PostStatus::parse(&status_str)
        .ok_or_else(|| ServiceError::validation(format!("unknown post status '{}'", status_str)))?;

    Ok(Post {
        id: row.get(0).map_err(read)?,
        author_id: row.get(1).map_err(read)?,
        status,
        publish_at: publish_at.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
    })
}

fn row_to_tag(row: &libsql::Row) -> Result<Tag, ServiceError> {
    let read = |e| ServiceError::from_sql("Failed to read tag column", e);
    Ok(Tag {
        id: row.get(0).map_err(read)?,
        name: row.get(1).map_err(read)?,
        slug: row.get(2).map_err(read)?,
    })
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, ServiceError> {
    parse_timestamp(s).map_err(|e| {
        ServiceError::Database(crate::db::DatabaseError::sql_execution(e.to_string()))
    })
}

async fn fetch_post(conn: &Connection, id: i64) -> Result<Option<Post>, ServiceError> {
    let mut rows = conn
        .query(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"),
            [id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post", e))?;

    match rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post row", e))?
    {
        Some(row) => Ok(Some(row_to_post(&row)?)),
        None => Ok(None),
    }
}

async fn fetch_post_translations(
    conn: &Connection,
    post_id: i64,
) -> Result<Vec<PostTranslation>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT post_id, language, title, slug, body, seo_title, seo_description
             FROM post_translations WHERE post_id = ? ORDER BY language",
            [post_id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post translations", e))?;

    let mut translations = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post translation row", e))?
    {
        translations.push(row_to_post_translation(&row)?);
    }
    Ok(translations)
}

async fn fetch_post_translation(
    conn: &Connection,
    post_id: i64,
    language: &str,
) -> Result<Option<PostTranslation>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT post_id, language, title, slug, body, seo_title, seo_description
             FROM post_translations WHERE post_id = ? AND language = ?",
            (post_id, language),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post translation", e))?;

    match rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post translation row", e))?
    {
        Some(row) => Ok(Some(row_to_post_translation(&row)?)),
        None => Ok(None),
    }
}

fn row_to_post_translation(row: &libsql::Row) -> Result<PostTranslation, ServiceError> {
    let read = |e| ServiceError::from_sql("Failed to read post translation column", e);
    Ok(PostTranslation {
        post_id: row.get(0).map_err(read)?,
        language: row.get(1).map_err(read)?,
        title: row.get(2).map_err(read)?,
        slug: row.get(3).map_err(read)?,
        body: row.get(4).map_err(read)?,
        seo_title: row.get(5).map_err(read)?,
        seo_description: row.get(6).map_err(read)?,
    })
}

async fn fetch_post_tags(conn: &Connection, post_id: i64) -> Result<Vec<Tag>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT t.id, t.name, t.slug FROM tags t
             JOIN post_tags pt ON pt.tag_id = t.id
             WHERE pt.post_id = ?
             ORDER BY t.name, t.id",
            [post_id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post tags", e))?;

    let mut tags = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch post tag row", e))?
    {
        tags.push(row_to_tag(&row)?);
    }
    Ok(tags)
}

async fn tag_exists(conn: &Connection, tag_id: i64) -> Result<bool, ServiceError> {
    let mut rows = conn
        .query("SELECT 1 FROM tags WHERE id = ?", [tag_id])
        .await
        .map_err(|e| ServiceError::from_sql("Failed to check tag", e))?;
    Ok(rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch tag check row", e))?
        .is_some())
}

async fn touch(conn: &Connection, post_id: i64) -> Result<(), ServiceError> {
    conn.execute(
        "UPDATE posts SET updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        [post_id],
    )
    .await
    .map_err(|e| ServiceError::from_sql("Failed to touch post", e))?;
    Ok(())
}
