//! Post lifecycle integration tests: slugs, scheduling, tags, trash.

use chrono::{Duration, Utc};
use folio_core::db::DatabaseService;
use folio_core::models::PostStatus;
use folio_core::services::posts::{NewPost, PostService, TagService};
use folio_core::services::{RestrictedSanitizer, ServiceError};
use std::sync::Arc;
use tempfile::TempDir;

async fn post_setup() -> (TempDir, PostService, TagService) {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(
        DatabaseService::new(temp.path().join("folio.db"))
            .await
            .unwrap(),
    );
    let posts = PostService::new(db.clone(), Arc::new(RestrictedSanitizer::default()));
    (temp, posts, TagService::new(db))
}

fn new_post(title: &str, slug: &str) -> NewPost {
    NewPost {
        author_id: None,
        language: "en".to_string(),
        title: title.to_string(),
        slug: Some(slug.to_string()),
        body: None,
        seo_title: None,
        seo_description: None,
    }
}

#[tokio::test]
async fn test_duplicate_slug_in_language_conflicts() {
    let (_temp, posts, _tags) = post_setup().await;
    posts.create(new_post("Hello", "hello")).await.unwrap();

    let result = posts.create(new_post("Hello Again", "hello")).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn test_same_slug_in_other_language_is_fine() {
    let (_temp, posts, _tags) = post_setup().await;
    let first = posts.create(new_post("Hello", "hello")).await.unwrap();
    let second = posts.create(new_post("Other", "other")).await.unwrap();

    // The German translation may reuse a slug taken in English
    posts
        .update_translation(
            second.post.id,
            "de",
            folio_core::services::posts::PostTranslationUpdate {
                title: Some("Hallo".to_string()),
                slug: Some("hello".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let detail = posts.get(second.post.id).await.unwrap();
    assert_eq!(detail.translations.len(), 2);
    let _ = first;
}

#[tokio::test]
async fn test_publish_sweep_promotes_due_posts_only() {
    let (_temp, posts, _tags) = post_setup().await;
    let due = posts.create(new_post("Due", "due")).await.unwrap();
    let future = posts.create(new_post("Future", "future")).await.unwrap();
    let draft = posts.create(new_post("Draft", "draft-post")).await.unwrap();

    let now = Utc::now();
    posts
        .set_status(due.post.id, PostStatus::Scheduled, Some(now - Duration::minutes(5)))
        .await
        .unwrap();
    posts
        .set_status(future.post.id, PostStatus::Scheduled, Some(now + Duration::hours(1)))
        .await
        .unwrap();

    let published = posts.publish_due(now).await.unwrap();
    assert_eq!(published, vec![due.post.id]);

    assert_eq!(
        posts.get(due.post.id).await.unwrap().post.status,
        PostStatus::Published
    );
    assert_eq!(
        posts.get(future.post.id).await.unwrap().post.status,
        PostStatus::Scheduled
    );
    assert_eq!(
        posts.get(draft.post.id).await.unwrap().post.status,
        PostStatus::Draft
    );
}

#[tokio::test]
async fn test_scheduling_requires_publish_time() {
    let (_temp, posts, _tags) = post_setup().await;
    let post = posts.create(new_post("P", "p")).await.unwrap();

    let result = posts
        .set_status(post.post.id, PostStatus::Scheduled, None)
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_tag_assignment_is_idempotent() {
    let (_temp, posts, tags) = post_setup().await;
    let post = posts.create(new_post("Tagged", "tagged")).await.unwrap();
    let rust = tags.create("Rust", None).await.unwrap();
    assert_eq!(rust.slug, "rust");

    posts.add_tags(post.post.id, &[rust.id]).await.unwrap();
    posts.add_tags(post.post.id, &[rust.id]).await.unwrap();
    assert_eq!(posts.get(post.post.id).await.unwrap().tags.len(), 1);

    posts.remove_tags(post.post.id, &[rust.id]).await.unwrap();
    posts.remove_tags(post.post.id, &[rust.id]).await.unwrap();
    assert!(posts.get(post.post.id).await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn test_deleting_tag_detaches_it_from_posts() {
    let (_temp, posts, tags) = post_setup().await;
    let post = posts.create(new_post("Tagged", "tagged")).await.unwrap();
    let tag = tags.create("Old", None).await.unwrap();
    posts.add_tags(post.post.id, &[tag.id]).await.unwrap();

    tags.delete(tag.id).await.unwrap();
    assert!(posts.get(post.post.id).await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn test_trash_and_purge_window() {
    let (_temp, posts, _tags) = post_setup().await;
    let post = posts.create(new_post("Gone", "gone")).await.unwrap();
    posts.soft_delete(post.post.id).await.unwrap();

    assert_eq!(posts.list_trash().await.unwrap().len(), 1);

    // Inside the retention window: nothing purged
    let purged = posts.purge_expired(Utc::now(), 30).await.unwrap();
    assert_eq!(purged, 0);

    // Past the window: row is hard-deleted
    let purged = posts
        .purge_expired(Utc::now() + Duration::days(31), 30)
        .await
        .unwrap();
    assert_eq!(purged, 1);
    assert!(posts.list_trash().await.unwrap().is_empty());
    assert!(matches!(
        posts.get(post.post.id).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_restore_from_trash() {
    let (_temp, posts, _tags) = post_setup().await;
    let post = posts.create(new_post("Back", "back")).await.unwrap();
    posts.soft_delete(post.post.id).await.unwrap();
    let restored = posts.restore(post.post.id).await.unwrap();
    assert!(restored.post.deleted_at.is_none());
    assert_eq!(posts.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_body_sanitized_and_slug_derived() {
    let (_temp, posts, _tags) = post_setup().await;
    let detail = posts
        .create(NewPost {
            author_id: None,
            language: "en".to_string(),
            title: "Café & Croissants".to_string(),
            slug: None,
            body: Some(r#"<p>ok</p><a href="javascript:x()">bad</a>"#.to_string()),
            seo_title: None,
            seo_description: None,
        })
        .await
        .unwrap();

    assert_eq!(detail.translations[0].slug, "cafe-croissants");
    assert_eq!(
        detail.translations[0].body.as_deref(),
        Some("<p>ok</p><a>bad</a>")
    );
}
