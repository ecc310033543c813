//! Category endpoints - same surface as pages over the category tree.

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

const KIND: NodeKind = NodeKind::Category;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/categories", get(tree).post(create))
        .route("/api/categories/reorder", post(reorder))
        .route("/api/categories/:id", get(get_category).delete(soft_delete))
        .route("/api/categories/:id/children", get(children))
        .route(
            "/api/categories/:id/translations/:language",
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

async fn get_category(
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
