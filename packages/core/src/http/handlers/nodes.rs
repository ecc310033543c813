//! Shared page/category tree endpoint logic
//!
//! Pages and categories expose identical routes over the same tree
//! engine; only the node kind differs. The resource modules call these
//! helpers with their kind fixed.

use crate::http::{ApiError, AppState};
use crate::models::{Node, NodeKind};
use crate::services::tree::{ChangedPaths, NewNode, NodeDetail, ReorderRequest, TranslationUpdate};
use axum::response::Json;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResponse {
    pub ok: bool,
    pub changed_paths: ChangedPaths,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub const OK: OkResponse = OkResponse { ok: true };

pub async fn tree(state: &AppState, kind: NodeKind) -> Result<Json<Vec<Node>>, ApiError> {
    Ok(Json(state.tree.tree(kind).await?))
}

pub async fn create(
    state: &AppState,
    kind: NodeKind,
    input: NewNode,
) -> Result<Json<NodeDetail>, ApiError> {
    Ok(Json(state.tree.create(kind, input).await?))
}

pub async fn get(state: &AppState, kind: NodeKind, id: i64) -> Result<Json<NodeDetail>, ApiError> {
    Ok(Json(state.tree.get(kind, id).await?))
}

pub async fn children(
    state: &AppState,
    kind: NodeKind,
    id: i64,
) -> Result<Json<Vec<Node>>, ApiError> {
    Ok(Json(state.tree.children(kind, Some(id)).await?))
}

pub async fn update_translation(
    state: &AppState,
    kind: NodeKind,
    id: i64,
    language: String,
    update: TranslationUpdate,
) -> Result<Json<ReorderResponse>, ApiError> {
    let changed_paths = state
        .tree
        .update_translation(kind, id, &language, update)
        .await?;
    Ok(Json(ReorderResponse {
        ok: true,
        changed_paths,
    }))
}

pub async fn reorder(
    state: &AppState,
    kind: NodeKind,
    request: ReorderRequest,
) -> Result<Json<ReorderResponse>, ApiError> {
    let changed_paths = state.tree.reorder(kind, request).await?;
    Ok(Json(ReorderResponse {
        ok: true,
        changed_paths,
    }))
}

pub async fn soft_delete(
    state: &AppState,
    kind: NodeKind,
    id: i64,
) -> Result<Json<OkResponse>, ApiError> {
    state.tree.soft_delete(kind, id).await?;
    Ok(Json(OK))
}
