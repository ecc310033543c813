//! Tree Service - page/category forest maintenance
//!
//! Pages and categories are parent-pointer forests over the `nodes`
//! table. This service owns every structural mutation:
//!
//! - **Create**: appends a node at the end of its parent's live children
//!   and writes the initial translation + full path.
//! - **Reorder**: relocates a node to a new parent and sibling position,
//!   rejecting cycles, rewriting the full sibling order (dense 0..n-1),
//!   and cascading a full-path rebuild over the moved subtree.
//! - **Soft delete / restore**: cascades over the live subtree with one
//!   shared timestamp; restore revives exactly that set.
//!
//! All multi-statement operations run inside one explicit transaction so
//! concurrent reorders serialize at the database level and no partial
//! renumbering is ever visible.

use crate::db::DatabaseService;
use crate::models::time::{parse_timestamp, to_sqlite};
use crate::models::{Node, NodeKind, Translation};
use crate::services::error::ServiceError;
use crate::services::path::build_full_path;
use crate::services::sanitize::HtmlSanitizer;
use crate::services::tx;
use crate::utils::slugify;
use chrono::Utc;
use libsql::Connection;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

const NODE_COLUMNS: &str = "id, kind, parent_id, order_index, created_at, updated_at, deleted_at";

/// Input for creating a node with its first translation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub parent_id: Option<i64>,
    pub language: String,
    pub title: String,
    /// Explicit slug; derived from the title when absent.
    pub slug: Option<String>,
    pub body: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// Partial update of one translation row. `None` fields are left as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// Reorder request: move `node_id` under `new_parent_id` (None = root) at
/// sibling position `new_index` (clamped).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub node_id: i64,
    pub new_parent_id: Option<i64>,
    #[serde(default)]
    pub new_index: i64,
}

/// A node together with all its translation rows.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: Node,
    pub translations: Vec<Translation>,
}

/// Node id → language → new full path, for every path a structural
/// change moved. Callers use it for cache invalidation.
pub type ChangedPaths = BTreeMap<i64, BTreeMap<String, String>>;

/// Service for page/category tree maintenance.
pub struct TreeService {
    db: Arc<DatabaseService>,
    sanitizer: Arc<dyn HtmlSanitizer>,
}

impl TreeService {
    pub fn new(db: Arc<DatabaseService>, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        Self { db, sanitizer }
    }

    /// Create a node appended at the end of its parent's live children.
    pub async fn create(&self, kind: NodeKind, input: NewNode) -> Result<NodeDetail, ServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }
        if input.language.trim().is_empty() {
            return Err(ServiceError::validation("language must not be empty"));
        }

        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = self.create_in_tx(&conn, kind, &input, &title).await;
        match result {
            Ok(id) => {
                tx::commit(&conn).await?;
                self.get(kind, id).await
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
        kind: NodeKind,
        input: &NewNode,
        title: &str,
    ) -> Result<i64, ServiceError> {
        if let Some(parent_id) = input.parent_id {
            let parent = fetch_node(conn, kind, parent_id).await?;
            match parent {
                Some(p) if !p.is_deleted() => {}
                _ => return Err(ServiceError::not_found(kind_entity(kind), parent_id)),
            }
        }

        let order_index = count_live_children(conn, kind, input.parent_id).await?;

        match input.parent_id {
            Some(parent_id) => {
                conn.execute(
                    "INSERT INTO nodes (kind, parent_id, order_index) VALUES (?, ?, ?)",
                    (kind.as_str(), parent_id, order_index),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to insert node", e))?;
            }
            None => {
                conn.execute(
                    "INSERT INTO nodes (kind, parent_id, order_index) VALUES (?, NULL, ?)",
                    (kind.as_str(), order_index),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to insert node", e))?;
            }
        }
        let id = conn.last_insert_rowid();

        let slug = derive_slug(input.slug.as_deref(), title);
        let body = input
            .body
            .as_deref()
            .map(|b| self.sanitizer.sanitize(b));

        conn.execute(
            "INSERT INTO node_translations
                (node_id, language, title, slug, body, seo_title, seo_description)
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
        .map_err(|e| ServiceError::from_sql("Failed to insert translation", e))?;

        rebuild_paths(conn, &[id], None).await?;

        Ok(id)
    }

    /// Fetch a live node with all its translations.
    pub async fn get(&self, kind: NodeKind, id: i64) -> Result<NodeDetail, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;

        let node = match fetch_node(&conn, kind, id).await? {
            Some(n) if !n.is_deleted() => n,
            _ => return Err(ServiceError::not_found(kind_entity(kind), id)),
        };

        let translations = fetch_translations(&conn, id).await?;
        Ok(NodeDetail { node, translations })
    }

    /// Live children of a parent (None = root level), in sibling order.
    pub async fn children(
        &self,
        kind: NodeKind,
        parent_id: Option<i64>,
    ) -> Result<Vec<Node>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        fetch_live_children(&conn, kind, parent_id).await
    }

    /// Every live node of a kind, grouped by parent with siblings in
    /// order, for building the admin tree view in one query.
    pub async fn tree(&self, kind: NodeKind) -> Result<Vec<Node>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {NODE_COLUMNS} FROM nodes
                     WHERE kind = ? AND deleted_at IS NULL
                     ORDER BY parent_id, order_index, id"
                ),
                [kind.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list tree", e))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch tree row", e))?
        {
            nodes.push(row_to_node(&row)?);
        }
        Ok(nodes)
    }

    /// Relocate a node (see module docs). Returns every full path the
    /// move changed, across all languages.
    #[instrument(skip(self), fields(kind = kind.as_str()))]
    pub async fn reorder(
        &self,
        kind: NodeKind,
        request: ReorderRequest,
    ) -> Result<ChangedPaths, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = self.reorder_in_tx(&conn, kind, &request).await;
        match result {
            Ok(changed) => {
                tx::commit(&conn).await?;
                debug!(
                    node_id = request.node_id,
                    changed = changed.len(),
                    "Reorder committed"
                );
                Ok(changed)
            }
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    async fn reorder_in_tx(
        &self,
        conn: &Connection,
        kind: NodeKind,
        request: &ReorderRequest,
    ) -> Result<ChangedPaths, ServiceError> {
        let node_id = request.node_id;
        match fetch_node(conn, kind, node_id).await? {
            Some(n) if !n.is_deleted() => {}
            _ => return Err(ServiceError::not_found(kind_entity(kind), node_id)),
        }

        // Step 1: cycle check before any write. Walking the live
        // descendants of the moved node catches both self-parenting and
        // moves under the node's own subtree.
        if let Some(new_parent_id) = request.new_parent_id {
            if new_parent_id == node_id {
                return Err(ServiceError::cycle(node_id, new_parent_id));
            }
            match fetch_node(conn, kind, new_parent_id).await? {
                Some(p) if !p.is_deleted() => {}
                _ => return Err(ServiceError::not_found(kind_entity(kind), new_parent_id)),
            }
            let subtree = collect_live_subtree(conn, kind, node_id).await?;
            if subtree.contains(&new_parent_id) {
                return Err(ServiceError::cycle(node_id, new_parent_id));
            }
        }

        // Step 2: reassign the parent before reading the sibling list so
        // the moved node cannot appear twice.
        match request.new_parent_id {
            Some(new_parent_id) => {
                conn.execute(
                    "UPDATE nodes SET parent_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                    (new_parent_id, node_id),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to reassign parent", e))?;
            }
            None => {
                conn.execute(
                    "UPDATE nodes SET parent_id = NULL, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                    [node_id],
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to reassign parent", e))?;
            }
        }

        // Steps 3-5: fetch the other live siblings, insert the moved node
        // at the clamped index, and rewrite every order_index. The full
        // rewrite guarantees density even if prior state had drifted.
        let mut sibling_ids =
            fetch_live_sibling_ids(conn, kind, request.new_parent_id, Some(node_id)).await?;
        let index = request.new_index.clamp(0, sibling_ids.len() as i64) as usize;
        sibling_ids.insert(index, node_id);
        renumber(conn, &sibling_ids).await?;

        // Step 6: cascade the full-path rebuild over the moved subtree.
        let subtree = collect_live_subtree(conn, kind, node_id).await?;
        let changed = rebuild_paths(conn, &subtree, None).await?;

        Ok(group_changed_paths(changed))
    }

    /// Create or update one translation. A slug change cascades a
    /// full-path rebuild over the node's live subtree for that language.
    pub async fn update_translation(
        &self,
        kind: NodeKind,
        node_id: i64,
        language: &str,
        update: TranslationUpdate,
    ) -> Result<ChangedPaths, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = self
            .update_translation_in_tx(&conn, kind, node_id, language, &update)
            .await;
        match result {
            Ok(changed) => {
                tx::commit(&conn).await?;
                Ok(changed)
            }
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    async fn update_translation_in_tx(
        &self,
        conn: &Connection,
        kind: NodeKind,
        node_id: i64,
        language: &str,
        update: &TranslationUpdate,
    ) -> Result<ChangedPaths, ServiceError> {
        match fetch_node(conn, kind, node_id).await? {
            Some(n) if !n.is_deleted() => {}
            _ => return Err(ServiceError::not_found(kind_entity(kind), node_id)),
        }

        let existing = fetch_translation(conn, node_id, language).await?;

        let (title, old_slug) = match &existing {
            Some(t) => (
                update.title.clone().unwrap_or_else(|| t.title.clone()),
                Some(t.slug.clone()),
            ),
            None => {
                let title = update
                    .title
                    .clone()
                    .ok_or_else(|| {
                        ServiceError::validation("title is required for a new translation")
                    })?;
                (title, None)
            }
        };
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }

        let slug = match (&update.slug, &old_slug) {
            (Some(explicit), _) => derive_slug(Some(explicit), &title),
            (None, Some(old)) => old.clone(),
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
            "INSERT INTO node_translations
                (node_id, language, title, slug, body, seo_title, seo_description)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (node_id, language) DO UPDATE SET
                title = excluded.title,
                slug = excluded.slug,
                body = excluded.body,
                seo_title = excluded.seo_title,
                seo_description = excluded.seo_description",
            (
                node_id,
                language,
                title.as_str(),
                slug.as_str(),
                body.as_deref(),
                seo_title.as_deref(),
                seo_description.as_deref(),
            ),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to upsert translation", e))?;

        // Only a slug change moves any path; new translations need their
        // first path build either way.
        let slug_changed = old_slug.as_deref() != Some(slug.as_str());
        let changed = if slug_changed {
            let subtree = collect_live_subtree(conn, kind, node_id).await?;
            rebuild_paths(conn, &subtree, Some(language)).await?
        } else {
            Vec::new()
        };

        Ok(group_changed_paths(changed))
    }

    /// Soft-delete a node and its entire live subtree with one shared
    /// timestamp, then renumber the remaining siblings.
    pub async fn soft_delete(&self, kind: NodeKind, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = soft_delete_in_tx(&conn, kind, id).await;
        match result {
            Ok(()) => tx::commit(&conn).await,
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// Restore a soft-deleted subtree: exactly the rows that were
    /// deleted together (same timestamp) come back. The root re-appends
    /// at the end of its old parent's children, or at root level when
    /// that parent is itself deleted or gone.
    pub async fn restore(&self, kind: NodeKind, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        tx::begin(&conn).await?;
        let result = restore_in_tx(&conn, kind, id).await;
        match result {
            Ok(()) => tx::commit(&conn).await,
            Err(e) => {
                tx::rollback(&conn).await;
                Err(e)
            }
        }
    }

    /// All soft-deleted nodes of a kind, most recently deleted first.
    pub async fn list_trash(&self, kind: NodeKind) -> Result<Vec<Node>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {NODE_COLUMNS} FROM nodes
                     WHERE kind = ? AND deleted_at IS NOT NULL
                     ORDER BY deleted_at DESC, id"
                ),
                [kind.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list trash", e))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch trash row", e))?
        {
            nodes.push(row_to_node(&row)?);
        }
        Ok(nodes)
    }

    /// Hard-delete nodes soft-deleted before the retention cutoff.
    /// Translations and descendants go with them via foreign-key cascade.
    pub async fn purge_expired(
        &self,
        now: chrono::DateTime<Utc>,
        retention_days: i64,
    ) -> Result<u64, ServiceError> {
        let cutoff = to_sqlite(now - chrono::Duration::days(retention_days));
        let conn = self.db.connect_with_timeout().await?;
        let purged = conn
            .execute(
                "DELETE FROM nodes WHERE deleted_at IS NOT NULL AND deleted_at < ?",
                [cutoff.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to purge nodes", e))?;
        Ok(purged)
    }
}

fn group_changed_paths(changed: Vec<(i64, String, String)>) -> ChangedPaths {
    let mut grouped: ChangedPaths = BTreeMap::new();
    for (id, language, path) in changed {
        grouped.entry(id).or_default().insert(language, path);
    }
    grouped
}

fn kind_entity(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Page => "page",
        NodeKind::Category => "category",
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

pub(crate) fn row_to_node(row: &libsql::Row) -> Result<Node, ServiceError> {
    let id: i64 = row
        .get(0)
        .map_err(|e| ServiceError::from_sql("Failed to read node id", e))?;
    let kind_str: String = row
        .get(1)
        .map_err(|e| ServiceError::from_sql("Failed to read node kind", e))?;
    let parent_id: Option<i64> = row
        .get(2)
        .map_err(|e| ServiceError::from_sql("Failed to read parent_id", e))?;
    let order_index: i64 = row
        .get(3)
        .map_err(|e| ServiceError::from_sql("Failed to read order_index", e))?;
    let created_at: String = row
        .get(4)
        .map_err(|e| ServiceError::from_sql("Failed to read created_at", e))?;
    let updated_at: String = row
        .get(5)
        .map_err(|e| ServiceError::from_sql("Failed to read updated_at", e))?;
    let deleted_at: Option<String> = row
        .get(6)
        .map_err(|e| ServiceError::from_sql("Failed to read deleted_at", e))?;

    let kind = NodeKind::parse(&kind_str)
        .ok_or_else(|| ServiceError::validation(format!("unknown node kind '{}'", kind_str)))?;

    Ok(Node {
        id,
        kind,
        parent_id,
        order_index,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
    })
}

fn parse_ts(s: &str) -> Result<chrono::DateTime<Utc>, ServiceError> {
    parse_timestamp(s).map_err(|e| {
        ServiceError::Database(crate::db::DatabaseError::sql_execution(e.to_string()))
    })
}

pub(crate) async fn fetch_node(
    conn: &Connection,
    kind: NodeKind,
    id: i64,
) -> Result<Option<Node>, ServiceError> {
    let mut rows = conn
        .query(
            &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ? AND kind = ?"),
            (id, kind.as_str()),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch node", e))?;

    match rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch node row", e))?
    {
        Some(row) => Ok(Some(row_to_node(&row)?)),
        None => Ok(None),
    }
}

async fn fetch_live_children(
    conn: &Connection,
    kind: NodeKind,
    parent_id: Option<i64>,
) -> Result<Vec<Node>, ServiceError> {
    let mut rows = match parent_id {
        Some(parent_id) => conn
            .query(
                &format!(
                    "SELECT {NODE_COLUMNS} FROM nodes
                     WHERE kind = ? AND parent_id = ? AND deleted_at IS NULL
                     ORDER BY order_index, id"
                ),
                (kind.as_str(), parent_id),
            )
            .await,
        None => conn
            .query(
                &format!(
                    "SELECT {NODE_COLUMNS} FROM nodes
                     WHERE kind = ? AND parent_id IS NULL AND deleted_at IS NULL
                     ORDER BY order_index, id"
                ),
                [kind.as_str()],
            )
            .await,
    }
    .map_err(|e| ServiceError::from_sql("Failed to fetch children", e))?;

    let mut nodes = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch child row", e))?
    {
        nodes.push(row_to_node(&row)?);
    }
    Ok(nodes)
}

/// Ordered live sibling ids under a parent, optionally excluding one node
/// (the one being moved). Deterministic tie-break on id.
async fn fetch_live_sibling_ids(
    conn: &Connection,
    kind: NodeKind,
    parent_id: Option<i64>,
    exclude: Option<i64>,
) -> Result<Vec<i64>, ServiceError> {
    let children = fetch_live_children(conn, kind, parent_id).await?;
    Ok(children
        .into_iter()
        .map(|n| n.id)
        .filter(|id| Some(*id) != exclude)
        .collect())
}

async fn count_live_children(
    conn: &Connection,
    kind: NodeKind,
    parent_id: Option<i64>,
) -> Result<i64, ServiceError> {
    Ok(fetch_live_sibling_ids(conn, kind, parent_id, None).await?.len() as i64)
}

/// Rewrite order_index for every id to its position in the list.
async fn renumber(conn: &Connection, ordered_ids: &[i64]) -> Result<(), ServiceError> {
    for (position, id) in ordered_ids.iter().enumerate() {
        conn.execute(
            "UPDATE nodes SET order_index = ? WHERE id = ?",
            (position as i64, *id),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to renumber sibling", e))?;
    }
    Ok(())
}

/// Depth-first collection of a node's live subtree, root included.
pub(crate) async fn collect_live_subtree(
    conn: &Connection,
    kind: NodeKind,
    root_id: i64,
) -> Result<Vec<i64>, ServiceError> {
    let mut result = vec![root_id];
    let mut queue = vec![root_id];

    while let Some(current) = queue.pop() {
        let children = fetch_live_sibling_ids(conn, kind, Some(current), None).await?;
        for child in children {
            result.push(child);
            queue.push(child);
        }
    }

    Ok(result)
}

/// Recompute full_path for every (node, language) pair in `node_ids`,
/// writing rows whose value changed. Returns `(node_id, language, path)`
/// for each change.
async fn rebuild_paths(
    conn: &Connection,
    node_ids: &[i64],
    only_language: Option<&str>,
) -> Result<Vec<(i64, String, String)>, ServiceError> {
    let mut changed = Vec::new();

    for &node_id in node_ids {
        let translations = fetch_translations(conn, node_id).await?;
        for translation in translations {
            if let Some(lang) = only_language {
                if translation.language != lang {
                    continue;
                }
            }

            let Some(build) = build_full_path(conn, node_id, &translation.language).await? else {
                continue;
            };

            if translation.full_path.as_deref() != Some(build.path.as_str()) {
                conn.execute(
                    "UPDATE node_translations SET full_path = ? WHERE node_id = ? AND language = ?",
                    (build.path.as_str(), node_id, translation.language.as_str()),
                )
                .await
                .map_err(|e| ServiceError::from_sql("Failed to update full_path", e))?;
                changed.push((node_id, translation.language.clone(), build.path));
            }
        }
    }

    Ok(changed)
}

async fn fetch_translations(
    conn: &Connection,
    node_id: i64,
) -> Result<Vec<Translation>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT node_id, language, title, slug, full_path, body, seo_title, seo_description
             FROM node_translations WHERE node_id = ? ORDER BY language",
            [node_id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch translations", e))?;

    let mut translations = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch translation row", e))?
    {
        translations.push(row_to_translation(&row)?);
    }
    Ok(translations)
}

async fn fetch_translation(
    conn: &Connection,
    node_id: i64,
    language: &str,
) -> Result<Option<Translation>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT node_id, language, title, slug, full_path, body, seo_title, seo_description
             FROM node_translations WHERE node_id = ? AND language = ?",
            (node_id, language),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch translation", e))?;

    match rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch translation row", e))?
    {
        Some(row) => Ok(Some(row_to_translation(&row)?)),
        None => Ok(None),
    }
}

fn row_to_translation(row: &libsql::Row) -> Result<Translation, ServiceError> {
    let read = |e| ServiceError::from_sql("Failed to read translation column", e);
    Ok(Translation {
        node_id: row.get(0).map_err(read)?,
        language: row.get(1).map_err(read)?,
        title: row.get(2).map_err(read)?,
        slug: row.get(3).map_err(read)?,
        full_path: row.get(4).map_err(read)?,
        body: row.get(5).map_err(read)?,
        seo_title: row.get(6).map_err(read)?,
        seo_description: row.get(7).map_err(read)?,
    })
}

async fn soft_delete_in_tx(
    conn: &Connection,
    kind: NodeKind,
    id: i64,
) -> Result<(), ServiceError> {
    let node = match fetch_node(conn, kind, id).await? {
        Some(n) if !n.is_deleted() => n,
        _ => return Err(ServiceError::not_found(kind_entity(kind), id)),
    };

    let timestamp = to_sqlite(Utc::now());
    let subtree = collect_live_subtree(conn, kind, id).await?;
    for &subtree_id in &subtree {
        conn.execute(
            "UPDATE nodes SET deleted_at = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            (timestamp.as_str(), subtree_id),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to soft-delete node", e))?;
    }

    // Keep the surviving siblings dense
    let siblings = fetch_live_sibling_ids(conn, kind, node.parent_id, None).await?;
    renumber(conn, &siblings).await?;

    Ok(())
}

async fn restore_in_tx(conn: &Connection, kind: NodeKind, id: i64) -> Result<(), ServiceError> {
    let node = match fetch_node(conn, kind, id).await? {
        Some(n) => n,
        None => return Err(ServiceError::not_found(kind_entity(kind), id)),
    };
    let Some(deleted_at) = node.deleted_at else {
        return Err(ServiceError::validation(format!(
            "{} {} is not in the trash",
            kind_entity(kind),
            id
        )));
    };
    let timestamp = to_sqlite(deleted_at);

    // Only rows deleted in the same cascade come back
    let subtree = collect_deleted_subtree(conn, kind, id, &timestamp).await?;

    // Re-attach under the old parent when it is still live, otherwise
    // promote to root level
    let target_parent = match node.parent_id {
        Some(parent_id) => match fetch_node(conn, kind, parent_id).await? {
            Some(p) if !p.is_deleted() => Some(parent_id),
            _ => None,
        },
        None => None,
    };
    let order_index = count_live_children(conn, kind, target_parent).await?;

    match target_parent {
        Some(parent_id) => {
            conn.execute(
                "UPDATE nodes SET deleted_at = NULL, parent_id = ?, order_index = ?,
                        updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?",
                (parent_id, order_index, id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore node", e))?;
        }
        None => {
            conn.execute(
                "UPDATE nodes SET deleted_at = NULL, parent_id = NULL, order_index = ?,
                        updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?",
                (order_index, id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore node", e))?;
        }
    }

    for &subtree_id in &subtree {
        if subtree_id == id {
            continue;
        }
        conn.execute(
            "UPDATE nodes SET deleted_at = NULL, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            [subtree_id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to restore descendant", e))?;
    }

    // Paths may have gone stale while the subtree sat in the trash
    let restored = collect_live_subtree(conn, kind, id).await?;
    rebuild_paths(conn, &restored, None).await?;

    Ok(())
}

/// Breadth-first collection of the subtree rows sharing one soft-delete
/// timestamp (a single cascade), root included.
async fn collect_deleted_subtree(
    conn: &Connection,
    kind: NodeKind,
    root_id: i64,
    timestamp: &str,
) -> Result<Vec<i64>, ServiceError> {
    let mut result = vec![root_id];
    let mut queue = vec![root_id];

    while let Some(current) = queue.pop() {
        let mut rows = conn
            .query(
                "SELECT id FROM nodes
                 WHERE kind = ? AND parent_id = ? AND deleted_at = ?
                 ORDER BY order_index, id",
                (kind.as_str(), current, timestamp),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch deleted children", e))?;

        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch deleted child row", e))?
        {
            let child: i64 = row
                .get(0)
                .map_err(|e| ServiceError::from_sql("Failed to read deleted child id", e))?;
            result.push(child);
            queue.push(child);
        }
    }

    Ok(result)
}
