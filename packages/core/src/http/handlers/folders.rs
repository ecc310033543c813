//! Media folder endpoints
//!
//! - `GET /api/folders` / `POST /api/folders`
//! - `PUT /api/folders/:id` - rename
//! - `DELETE /api/folders/:id` - move subtree to trash
//! - `POST /api/folders/:id/move` - relocate in the tree
//! - `POST /api/folders/:id/restore`
//! - `POST /api/folders/:id/files` / `DELETE /api/folders/:id/files` -
//!   batch assign/unassign

use super::nodes::{OkResponse, OK};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::models::MediaFolder;
use crate::services::folders::FolderMove;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/folders", get(tree).post(create))
        .route("/api/folders/:id", put(rename).delete(soft_delete))
        .route("/api/folders/:id/move", post(move_folder))
        .route("/api/folders/:id/restore", post(restore))
        .route("/api/folders/:id/files", post(assign).delete(unassign))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewFolder {
    name: String,
    parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameInput {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileSelection {
    media_ids: Vec<i64>,
}

async fn tree(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaFolder>>, ApiError> {
    Ok(Json(state.folders.tree().await?))
}

async fn create(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<NewFolder>,
) -> Result<Json<MediaFolder>, ApiError> {
    Ok(Json(state.folders.create(&input.name, input.parent_id).await?))
}

async fn rename(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<RenameInput>,
) -> Result<Json<MediaFolder>, ApiError> {
    Ok(Json(state.folders.rename(id, &input.name).await?))
}

async fn soft_delete(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    state.folders.soft_delete(id).await?;
    Ok(Json(OK))
}

async fn move_folder(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<FolderMove>,
) -> Result<Json<OkResponse>, ApiError> {
    state.folders.r#move(id, request).await?;
    Ok(Json(OK))
}

async fn restore(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    state.folders.restore(id).await?;
    Ok(Json(OK))
}

async fn assign(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(selection): Json<FileSelection>,
) -> Result<Json<OkResponse>, ApiError> {
    state.folders.assign(id, &selection.media_ids).await?;
    Ok(Json(OK))
}

async fn unassign(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(selection): Json<FileSelection>,
) -> Result<Json<OkResponse>, ApiError> {
    state.folders.unassign(id, &selection.media_ids).await?;
    Ok(Json(OK))
}
