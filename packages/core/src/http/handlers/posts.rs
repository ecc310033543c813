//! Post endpoints
//!
//! - `GET /api/posts` / `POST /api/posts`
//! - `GET /api/posts/:id` / `DELETE /api/posts/:id`
//! - `PUT /api/posts/:id/translations/:language`
//! - `PUT /api/posts/:id/status` - lifecycle transitions
//! - `POST /api/posts/:id/tags` / `DELETE /api/posts/:id/tags` - batch
//!   tag assignment

use super::nodes::{OkResponse, OK};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::models::{Post, PostStatus};
use crate::services::posts::{NewPost, PostDetail, PostTranslationUpdate};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/posts", get(list).post(create))
        .route("/api/posts/:id", get(get_post).delete(soft_delete))
        .route(
            "/api/posts/:id/translations/:language",
            put(update_translation),
        )
        .route("/api/posts/:id/status", put(set_status))
        .route("/api/posts/:id/tags", axum::routing::post(add_tags).delete(remove_tags))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusChange {
    status: PostStatus,
    publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagSelection {
    tag_ids: Vec<i64>,
}

async fn list(_user: CurrentUser, State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list().await?))
}

async fn create(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<NewPost>,
) -> Result<Json<PostDetail>, ApiError> {
    Ok(Json(state.posts.create(input).await?))
}

async fn get_post(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError> {
    Ok(Json(state.posts.get(id).await?))
}

async fn soft_delete(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    state.posts.soft_delete(id).await?;
    Ok(Json(OK))
}

async fn update_translation(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path((id, language)): Path<(i64, String)>,
    Json(update): Json<PostTranslationUpdate>,
) -> Result<Json<PostDetail>, ApiError> {
    Ok(Json(state.posts.update_translation(id, &language, update).await?))
}

async fn set_status(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Result<Json<PostDetail>, ApiError> {
    Ok(Json(
        state
            .posts
            .set_status(id, change.status, change.publish_at)
            .await?,
    ))
}

async fn add_tags(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(selection): Json<TagSelection>,
) -> Result<Json<PostDetail>, ApiError> {
    state.posts.add_tags(id, &selection.tag_ids).await?;
    Ok(Json(state.posts.get(id).await?))
}

async fn remove_tags(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(selection): Json<TagSelection>,
) -> Result<Json<PostDetail>, ApiError> {
    state.posts.remove_tags(id, &selection.tag_ids).await?;
    Ok(Json(state.posts.get(id).await?))
}
