//! Media library integration tests: folders, filters, pagination.

use folio_core::db::DatabaseService;
use folio_core::models::{FolderFilter, MediaQuery, MediaSort, MimeGroup};
use folio_core::services::folders::{FolderMove, FolderService};
use folio_core::services::media::{MediaService, NewMedia};
use folio_core::services::ServiceError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

async fn media_setup() -> (TempDir, MediaService, FolderService) {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(
        DatabaseService::new(temp.path().join("folio.db"))
            .await
            .unwrap(),
    );
    (temp, MediaService::new(db.clone()), FolderService::new(db))
}

async fn register(media: &MediaService, name: &str, mime: &str, size: i64) -> i64 {
    media
        .register(NewMedia {
            filename: name.to_string(),
            original_name: name.to_string(),
            url: format!("/uploads/{}", name),
            mime_type: mime.to_string(),
            size_bytes: size,
        })
        .await
        .unwrap()
        .id
}

fn folder_query(folder_id: i64) -> MediaQuery {
    MediaQuery {
        folder: FolderFilter::Folder(folder_id),
        page: 1,
        page_size: 50,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_folder_restore_keeps_assignments() {
    let (_temp, media, folders) = media_setup().await;
    let folder = folders.create("Photos", None).await.unwrap();
    let first = register(&media, "a.jpg", "image/jpeg", 100).await;
    let second = register(&media, "b.jpg", "image/jpeg", 200).await;
    folders.assign(folder.id, &[first, second]).await.unwrap();

    folders.soft_delete(folder.id).await.unwrap();
    folders.restore(folder.id).await.unwrap();

    let page = media.list(&folder_query(folder.id)).await.unwrap();
    let ids: BTreeSet<i64> = page.items.iter().map(|m| m.id).collect();
    assert_eq!(ids, BTreeSet::from([first, second]));
}

#[tokio::test]
async fn test_image_filter_with_pagination() {
    let (_temp, media, _folders) = media_setup().await;
    for i in 0..5 {
        register(&media, &format!("img{}.png", i), "image/png", 10 * i).await;
    }
    register(&media, "notes.txt", "text/plain", 5).await;
    register(&media, "clip.mp4", "video/mp4", 999).await;

    let query = MediaQuery {
        mime_group: Some(MimeGroup::Image),
        sort: MediaSort::CreatedDesc,
        page: 1,
        page_size: 2,
        ..Default::default()
    };
    let page = media.list(&query).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 5);
    assert!(page.items.iter().all(|m| m.mime_type.starts_with("image/")));
}

#[tokio::test]
async fn test_pagination_yields_each_row_exactly_once() {
    let (_temp, media, _folders) = media_setup().await;
    let mut expected = BTreeSet::new();
    for i in 0..7 {
        expected.insert(register(&media, &format!("f{}.png", i), "image/png", i).await);
    }

    let mut seen = Vec::new();
    for page_number in 1..=4 {
        let query = MediaQuery {
            sort: MediaSort::CreatedDesc,
            page: page_number,
            page_size: 2,
            ..Default::default()
        };
        let page = media.list(&query).await.unwrap();
        assert_eq!(page.total, 7);
        seen.extend(page.items.iter().map(|m| m.id));
    }

    assert_eq!(seen.len(), 7, "no row repeated across pages");
    assert_eq!(seen.iter().copied().collect::<BTreeSet<_>>(), expected);
}

#[tokio::test]
async fn test_assignment_is_idempotent() {
    let (_temp, media, folders) = media_setup().await;
    let folder = folders.create("Docs", None).await.unwrap();
    let file = register(&media, "manual.pdf", "application/pdf", 100).await;

    folders.assign(folder.id, &[file]).await.unwrap();
    folders.assign(folder.id, &[file]).await.unwrap();
    assert_eq!(media.list(&folder_query(folder.id)).await.unwrap().total, 1);

    // Unassigning a file that is not in the folder is a no-op
    let other = register(&media, "other.pdf", "application/pdf", 100).await;
    folders.unassign(folder.id, &[other]).await.unwrap();
    assert_eq!(media.list(&folder_query(folder.id)).await.unwrap().total, 1);

    folders.unassign(folder.id, &[file]).await.unwrap();
    assert_eq!(media.list(&folder_query(folder.id)).await.unwrap().total, 0);
}

#[tokio::test]
async fn test_unassigned_filter() {
    let (_temp, media, folders) = media_setup().await;
    let folder = folders.create("Photos", None).await.unwrap();
    let assigned = register(&media, "in.png", "image/png", 1).await;
    let loose = register(&media, "out.png", "image/png", 1).await;
    folders.assign(folder.id, &[assigned]).await.unwrap();

    let query = MediaQuery {
        folder: FolderFilter::Unassigned,
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let page = media.list(&query).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, loose);
}

#[tokio::test]
async fn test_text_search_is_case_insensitive() {
    let (_temp, media, _folders) = media_setup().await;
    register(&media, "Company-Logo.svg", "image/svg+xml", 1).await;
    register(&media, "banner.png", "image/png", 1).await;

    let query = MediaQuery {
        text: Some("LOGO".to_string()),
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let page = media.list(&query).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].filename, "Company-Logo.svg");
}

#[tokio::test]
async fn test_soft_deleted_media_hidden_until_restored() {
    let (_temp, media, _folders) = media_setup().await;
    let id = register(&media, "gone.png", "image/png", 1).await;

    media.soft_delete(id).await.unwrap();
    assert!(matches!(
        media.get(id).await,
        Err(ServiceError::NotFound { .. })
    ));
    let page = media.list(&MediaQuery { page: 1, page_size: 10, ..Default::default() }).await.unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(media.list_trash().await.unwrap().len(), 1);

    media.restore(id).await.unwrap();
    assert_eq!(media.get(id).await.unwrap().id, id);
}

#[tokio::test]
async fn test_folder_move_rejects_cycles() {
    let (_temp, _media, folders) = media_setup().await;
    let top = folders.create("Top", None).await.unwrap();
    let nested = folders.create("Nested", Some(top.id)).await.unwrap();

    let result = folders
        .r#move(
            top.id,
            FolderMove {
                new_parent_id: Some(nested.id),
                new_index: 0,
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Cycle { .. })));
}

#[tokio::test]
async fn test_folder_tree_lists_siblings_in_order() {
    let (_temp, _media, folders) = media_setup().await;
    let first = folders.create("First", None).await.unwrap();
    let second = folders.create("Second", None).await.unwrap();
    let child = folders.create("Child", Some(first.id)).await.unwrap();

    folders
        .r#move(
            second.id,
            FolderMove {
                new_parent_id: None,
                new_index: 0,
            },
        )
        .await
        .unwrap();

    let tree = folders.tree().await.unwrap();
    let roots: Vec<i64> = tree
        .iter()
        .filter(|f| f.parent_id.is_none())
        .map(|f| f.id)
        .collect();
    assert_eq!(roots, vec![second.id, first.id]);
    assert!(tree.iter().any(|f| f.id == child.id));
}
