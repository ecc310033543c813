//! Page endpoints
//!
//! - `GET /api/pages` - full live tree
//! - `POST /api/pages` - create with first translation
//! - `POST /api/pages/reorder` - move within the tree
//! - `GET /api/pages/:id` - node with translations
//! - `DELETE /api/pages/:id` - move subtree to trash
//! - `GET /api/pages/:id/children` - direct live children
//! - `PUT /api/pages/:id/translations/:language` - upsert translation

use super::nodes::{self, OkResponse, ReorderResponse};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::models::{Node, NodeKind};
use crate::services::tree::{NewNode, NodeDetail, ReorderRequest, TranslationUpdate};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};

const KIND: NodeKind = NodeKind::Page;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/pages", get(tree).post(create))
        .route("/api/pages/reorder", post(reorder))
        .route("/api/pages/:id", get(get_page).delete(soft_delete))
        .route("/api/pages/:id/children", get(children))
        .route(
            "/api/pages/:id/translations/:language",
            put(update_translation),
        )
        .with_state(state)
}

async fn tree(_user: CurrentUser, State(state): State<AppState>) -> Result<Json<Vec<Node>>, ApiError> {
    nodes::tree(&state, KIND).await
}

async fn create(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<NewNode>,
) -> Result<Json<NodeDetail>, ApiError> {
    nodes::create(&state, KIND, input).await
}

async fn reorder(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    nodes::reorder(&state, KIND, request).await
}

async fn get_page(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NodeDetail>, ApiError> {
    nodes::get(&state, KIND, id).await
}

async fn soft_delete(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    nodes::soft_delete(&state, KIND, id).await
}

async fn children(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Node>>, ApiError> {
    nodes::children(&state, KIND, id).await
}

async fn update_translation(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path((id, language)): Path<(i64, String)>,
    Json(update): Json<TranslationUpdate>,
) -> Result<Json<ReorderResponse>, ApiError> {
    nodes::update_translation(&state, KIND, id, language, update).await
}
