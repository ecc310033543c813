//! Hierarchy Path Builder
//!
//! Computes the materialized full path for one node in one language by
//! walking the parent chain upward and prepending each ancestor's slug.
//!
//! A missing ancestor row truncates the path at that point rather than
//! failing: the outcome carries a `truncated` flag and the caller logs the
//! integrity gap. An ancestor that exists but has no translation in the
//! requested language contributes no segment.

use crate::services::error::ServiceError;
use libsql::Connection;
use std::collections::HashSet;
use tracing::warn;

/// Result of a full-path build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBuild {
    /// `/`-joined path beginning with `/`, e.g. `/about/team`.
    pub path: String,
    /// True when an ancestor row was missing and the walk stopped early.
    pub truncated: bool,
}

/// Build the full path for `node_id` in `language`.
///
/// Returns `None` when the node itself has no translation row for the
/// language. The walk follows `parent_id` regardless of soft-delete
/// markers so a deleted subtree keeps coherent cached paths for restore.
pub async fn build_full_path(
    conn: &Connection,
    node_id: i64,
    language: &str,
) -> Result<Option<PathBuild>, ServiceError> {
    let Some((slug, parent_id)) = slug_and_parent(conn, node_id, language).await? else {
        return Ok(None);
    };

    let Some(slug) = slug else {
        // No translation for this language on the node itself
        return Ok(None);
    };

    let mut segments = vec![slug];
    let mut truncated = false;
    let mut visited: HashSet<i64> = HashSet::from([node_id]);
    let mut current = parent_id;

    while let Some(ancestor_id) = current {
        // Defensive guard: the reorder engine forbids cycles, but a walk
        // over corrupted data must still terminate.
        if !visited.insert(ancestor_id) {
            warn!(node_id, ancestor_id, "Parent chain revisits a node; stopping path walk");
            truncated = true;
            break;
        }

        match slug_and_parent(conn, ancestor_id, language).await? {
            Some((ancestor_slug, next_parent)) => {
                if let Some(ancestor_slug) = ancestor_slug {
                    segments.push(ancestor_slug);
                }
                current = next_parent;
            }
            None => {
                // Broken chain: ancestor row is gone. Report and truncate.
                warn!(
                    node_id,
                    missing_ancestor = ancestor_id,
                    "Broken ancestor chain while building full path"
                );
                truncated = true;
                break;
            }
        }
    }

    segments.reverse();
    Ok(Some(PathBuild {
        path: format!("/{}", segments.join("/")),
        truncated,
    }))
}

/// Fetch a node's slug for one language together with its parent pointer.
///
/// Outer `None` means the node row does not exist; inner `None` slug means
/// the node exists but has no translation for the language.
async fn slug_and_parent(
    conn: &Connection,
    node_id: i64,
    language: &str,
) -> Result<Option<(Option<String>, Option<i64>)>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT t.slug, n.parent_id
             FROM nodes n
             LEFT JOIN node_translations t
               ON t.node_id = n.id AND t.language = ?
             WHERE n.id = ?",
            (language, node_id),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to query node for path build", e))?;

    let Some(row) = rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch path build row", e))?
    else {
        return Ok(None);
    };

    let slug: Option<String> = row
        .get(0)
        .map_err(|e| ServiceError::from_sql("Failed to read slug", e))?;
    let parent_id: Option<i64> = row
        .get(1)
        .map_err(|e| ServiceError::from_sql("Failed to read parent_id", e))?;

    Ok(Some((slug, parent_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseService;
    use crate::models::NodeKind;
    use crate::services::sanitize::RestrictedSanitizer;
    use crate::services::tree::{NewNode, TreeService};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Arc<DatabaseService>, TreeService) {
        let temp = TempDir::new().unwrap();
        let db = Arc::new(
            DatabaseService::new(temp.path().join("folio.db"))
                .await
                .unwrap(),
        );
        let tree = TreeService::new(db.clone(), Arc::new(RestrictedSanitizer::default()));
        (temp, db, tree)
    }

    async fn create_page(tree: &TreeService, parent_id: Option<i64>, title: &str) -> i64 {
        tree.create(
            NodeKind::Page,
            NewNode {
                parent_id,
                language: "en".to_string(),
                title: title.to_string(),
                slug: None,
                body: None,
                seo_title: None,
                seo_description: None,
            },
        )
        .await
        .unwrap()
        .node
        .id
    }

    #[tokio::test]
    async fn test_intact_chain_builds_clean_path() {
        let (_temp, db, tree) = setup().await;
        let section = create_page(&tree, None, "Section").await;
        let page = create_page(&tree, Some(section), "Page").await;

        let conn = db.connect_with_timeout().await.unwrap();
        let build = build_full_path(&conn, page, "en").await.unwrap().unwrap();
        assert_eq!(build.path, "/section/page");
        assert!(!build.truncated);
    }

    #[tokio::test]
    async fn test_missing_ancestor_truncates_and_flags() {
        let (_temp, db, tree) = setup().await;
        let section = create_page(&tree, None, "Section").await;
        let page = create_page(&tree, Some(section), "Page").await;

        // Rip the ancestor row out from under the child to simulate a
        // data-integrity gap the reorder engine could never produce.
        let conn = db.connect_with_timeout().await.unwrap();
        let mut stmt = conn.prepare("PRAGMA foreign_keys = OFF").await.unwrap();
        let _ = stmt.query(()).await.unwrap();
        conn.execute("DELETE FROM nodes WHERE id = ?", [section])
            .await
            .unwrap();

        let build = build_full_path(&conn, page, "en").await.unwrap().unwrap();
        assert_eq!(build.path, "/page");
        assert!(build.truncated);
    }

    #[tokio::test]
    async fn test_missing_translation_on_node_returns_none() {
        let (_temp, db, tree) = setup().await;
        let page = create_page(&tree, None, "Page").await;

        let conn = db.connect_with_timeout().await.unwrap();
        let build = build_full_path(&conn, page, "de").await.unwrap();
        assert!(build.is_none());
    }
}
