//! Tag catalog endpoints

use super::nodes::{OkResponse, OK};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::models::Tag;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/tags", get(list).post(create))
        .route("/api/tags/:id", put(rename).delete(delete_tag))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagInput {
    name: String,
    slug: Option<String>,
}

async fn list(_user: CurrentUser, State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.tags.list().await?))
}

async fn create(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(
        state.tags.create(&input.name, input.slug.as_deref()).await?,
    ))
}

async fn rename(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(
        state
            .tags
            .rename(id, &input.name, input.slug.as_deref())
            .await?,
    ))
}

async fn delete_tag(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    state.tags.delete(id).await?;
    Ok(Json(OK))
}
