//! Page tree integration tests: reorder, paths, trash lifecycle.

use folio_core::db::DatabaseService;
use folio_core::models::NodeKind;
use folio_core::services::tree::{NewNode, ReorderRequest, TreeService};
use folio_core::services::{RestrictedSanitizer, ServiceError};
use std::sync::Arc;
use tempfile::TempDir;

async fn tree_service() -> (TempDir, TreeService) {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(
        DatabaseService::new(temp.path().join("folio.db"))
            .await
            .unwrap(),
    );
    let service = TreeService::new(db, Arc::new(RestrictedSanitizer::default()));
    (temp, service)
}

async fn create_page(
    service: &TreeService,
    parent_id: Option<i64>,
    title: &str,
    slug: &str,
) -> i64 {
    service
        .create(
            NodeKind::Page,
            NewNode {
                parent_id,
                language: "en".to_string(),
                title: title.to_string(),
                slug: Some(slug.to_string()),
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

async fn full_path(service: &TreeService, id: i64) -> String {
    service
        .get(NodeKind::Page, id)
        .await
        .unwrap()
        .translations
        .iter()
        .find(|t| t.language == "en")
        .and_then(|t| t.full_path.clone())
        .unwrap()
}

#[tokio::test]
async fn test_move_to_root_rebuilds_subtree_paths() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "A", "a").await;
    let b = create_page(&service, Some(a), "B", "b").await;
    let c = create_page(&service, Some(b), "C", "c").await;

    assert_eq!(full_path(&service, b).await, "/a/b");
    assert_eq!(full_path(&service, c).await, "/a/b/c");

    let changed = service
        .reorder(
            NodeKind::Page,
            ReorderRequest {
                node_id: b,
                new_parent_id: None,
                new_index: 0,
            },
        )
        .await
        .unwrap();

    assert_eq!(full_path(&service, b).await, "/b");
    assert_eq!(full_path(&service, c).await, "/b/c");
    assert_eq!(changed.get(&b).unwrap().get("en").unwrap(), "/b");
    assert_eq!(changed.get(&c).unwrap().get("en").unwrap(), "/b/c");
    // A's path did not move, so it is absent from the change set
    assert!(!changed.contains_key(&a));

    let a_children = service.children(NodeKind::Page, Some(a)).await.unwrap();
    assert!(a_children.is_empty());
}

#[tokio::test]
async fn test_reorder_to_front_renumbers_densely() {
    let (_temp, service) = tree_service().await;
    let parent = create_page(&service, None, "Parent", "parent").await;
    let first = create_page(&service, Some(parent), "First", "first").await;
    let second = create_page(&service, Some(parent), "Second", "second").await;
    let third = create_page(&service, Some(parent), "Third", "third").await;

    service
        .reorder(
            NodeKind::Page,
            ReorderRequest {
                node_id: third,
                new_parent_id: Some(parent),
                new_index: 0,
            },
        )
        .await
        .unwrap();

    let children = service.children(NodeKind::Page, Some(parent)).await.unwrap();
    let ids: Vec<i64> = children.iter().map(|n| n.id).collect();
    let order: Vec<i64> = children.iter().map(|n| n.order_index).collect();
    assert_eq!(ids, vec![third, first, second]);
    assert_eq!(order, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_move_under_own_descendant_is_rejected() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "A", "a").await;
    let b = create_page(&service, Some(a), "B", "b").await;
    let c = create_page(&service, Some(b), "C", "c").await;

    let result = service
        .reorder(
            NodeKind::Page,
            ReorderRequest {
                node_id: b,
                new_parent_id: Some(c),
                new_index: 0,
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Cycle { .. })));

    // Nothing moved
    let b_node = service.get(NodeKind::Page, b).await.unwrap().node;
    assert_eq!(b_node.parent_id, Some(a));
    assert_eq!(b_node.order_index, 0);
    let c_node = service.get(NodeKind::Page, c).await.unwrap().node;
    assert_eq!(c_node.parent_id, Some(b));
    assert_eq!(full_path(&service, c).await, "/a/b/c");
}

#[tokio::test]
async fn test_self_parenting_is_rejected() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "A", "a").await;

    let result = service
        .reorder(
            NodeKind::Page,
            ReorderRequest {
                node_id: a,
                new_parent_id: Some(a),
                new_index: 0,
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Cycle { .. })));
}

#[tokio::test]
async fn test_out_of_range_index_is_clamped() {
    let (_temp, service) = tree_service().await;
    let parent = create_page(&service, None, "Parent", "parent").await;
    let first = create_page(&service, Some(parent), "First", "first").await;
    let second = create_page(&service, Some(parent), "Second", "second").await;

    // Far past the end: lands last
    service
        .reorder(
            NodeKind::Page,
            ReorderRequest {
                node_id: first,
                new_parent_id: Some(parent),
                new_index: 99,
            },
        )
        .await
        .unwrap();
    let ids: Vec<i64> = service
        .children(NodeKind::Page, Some(parent))
        .await
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec![second, first]);

    // Negative: lands first
    service
        .reorder(
            NodeKind::Page,
            ReorderRequest {
                node_id: first,
                new_parent_id: Some(parent),
                new_index: -5,
            },
        )
        .await
        .unwrap();
    let ids: Vec<i64> = service
        .children(NodeKind::Page, Some(parent))
        .await
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn test_reorder_in_place_changes_nothing() {
    let (_temp, service) = tree_service().await;
    let parent = create_page(&service, None, "Parent", "parent").await;
    let first = create_page(&service, Some(parent), "First", "first").await;
    let second = create_page(&service, Some(parent), "Second", "second").await;

    let changed = service
        .reorder(
            NodeKind::Page,
            ReorderRequest {
                node_id: first,
                new_parent_id: Some(parent),
                new_index: 0,
            },
        )
        .await
        .unwrap();

    assert!(changed.is_empty());
    let ids: Vec<i64> = service
        .children(NodeKind::Page, Some(parent))
        .await
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn test_slug_change_rebuilds_descendant_paths() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "About", "about").await;
    let b = create_page(&service, Some(a), "Team", "team").await;

    let changed = service
        .update_translation(
            NodeKind::Page,
            a,
            "en",
            folio_core::services::tree::TranslationUpdate {
                slug: Some("company".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(full_path(&service, a).await, "/company");
    assert_eq!(full_path(&service, b).await, "/company/team");
    assert_eq!(changed.get(&b).unwrap().get("en").unwrap(), "/company/team");
}

#[tokio::test]
async fn test_second_language_gets_own_paths() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "About", "about").await;
    let b = create_page(&service, Some(a), "Team", "team").await;

    for (id, slug) in [(a, "ueber-uns"), (b, "mannschaft")] {
        service
            .update_translation(
                NodeKind::Page,
                id,
                "de",
                folio_core::services::tree::TranslationUpdate {
                    title: Some("Titel".to_string()),
                    slug: Some(slug.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let detail = service.get(NodeKind::Page, b).await.unwrap();
    let de = detail
        .translations
        .iter()
        .find(|t| t.language == "de")
        .unwrap();
    assert_eq!(de.full_path.as_deref(), Some("/ueber-uns/mannschaft"));
    // English path untouched
    assert_eq!(full_path(&service, b).await, "/about/team");
}

#[tokio::test]
async fn test_soft_delete_cascades_with_shared_timestamp() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "A", "a").await;
    let b = create_page(&service, Some(a), "B", "b").await;
    let c = create_page(&service, Some(b), "C", "c").await;
    let sibling = create_page(&service, Some(a), "S", "s").await;

    service.soft_delete(NodeKind::Page, b).await.unwrap();

    // B and C share one timestamp; the sibling survives and is renumbered
    let trash = service.list_trash(NodeKind::Page).await.unwrap();
    let trashed_ids: Vec<i64> = trash.iter().map(|n| n.id).collect();
    assert!(trashed_ids.contains(&b));
    assert!(trashed_ids.contains(&c));
    let b_deleted = trash.iter().find(|n| n.id == b).unwrap().deleted_at;
    let c_deleted = trash.iter().find(|n| n.id == c).unwrap().deleted_at;
    assert_eq!(b_deleted, c_deleted);

    let children = service.children(NodeKind::Page, Some(a)).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, sibling);
    assert_eq!(children[0].order_index, 0);

    assert!(matches!(
        service.get(NodeKind::Page, c).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_restore_revives_exactly_the_cascade() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "A", "a").await;
    let b = create_page(&service, Some(a), "B", "b").await;
    let c = create_page(&service, Some(b), "C", "c").await;

    service.soft_delete(NodeKind::Page, b).await.unwrap();
    service.restore(NodeKind::Page, b).await.unwrap();

    let b_node = service.get(NodeKind::Page, b).await.unwrap().node;
    assert_eq!(b_node.parent_id, Some(a));
    assert!(b_node.deleted_at.is_none());
    let c_node = service.get(NodeKind::Page, c).await.unwrap().node;
    assert!(c_node.deleted_at.is_none());
    assert_eq!(full_path(&service, c).await, "/a/b/c");
}

#[tokio::test]
async fn test_restore_falls_back_to_root_when_parent_is_gone() {
    let (_temp, service) = tree_service().await;
    let a = create_page(&service, None, "A", "a").await;
    let b = create_page(&service, Some(a), "B", "b").await;

    service.soft_delete(NodeKind::Page, a).await.unwrap();
    // Restore the child subtree while its old parent stays in the trash
    service.restore(NodeKind::Page, b).await.unwrap();

    let b_node = service.get(NodeKind::Page, b).await.unwrap().node;
    assert_eq!(b_node.parent_id, None);
    assert_eq!(full_path(&service, b).await, "/b");
    // A itself stays trashed
    assert!(matches!(
        service.get(NodeKind::Page, a).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_kinds_are_separate_forests() {
    let (_temp, service) = tree_service().await;
    let page = create_page(&service, None, "Page", "page").await;

    // A category cannot be fetched through the page kind and vice versa
    assert!(matches!(
        service.get(NodeKind::Category, page).await,
        Err(ServiceError::NotFound { .. })
    ));

    let category = service
        .create(
            NodeKind::Category,
            NewNode {
                parent_id: None,
                language: "en".to_string(),
                title: "News".to_string(),
                slug: None,
                body: None,
                seo_title: None,
                seo_description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        category.translations[0].slug, "news",
        "slug derives from title when omitted"
    );
    assert!(matches!(
        service.get(NodeKind::Page, category.node.id).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_body_is_sanitized_on_write() {
    let (_temp, service) = tree_service().await;
    let detail = service
        .create(
            NodeKind::Page,
            NewNode {
                parent_id: None,
                language: "en".to_string(),
                title: "Home".to_string(),
                slug: Some("home".to_string()),
                body: Some("<p>hi</p><script>alert(1)</script>".to_string()),
                seo_title: None,
                seo_description: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(detail.translations[0].body.as_deref(), Some("<p>hi</p>"));
}
