//! Trash endpoints
//!
//! One surface over every soft-deletable entity:
//! - `GET /api/trash/:entity` - list trashed rows
//! - `POST /api/trash/:entity/:id/restore`
//! - `POST /api/trash/purge` - empty the trash now (admin)

use super::nodes::{OkResponse, OK};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::models::NodeKind;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/trash/purge", post(purge_now))
        .route("/api/trash/:entity", get(list))
        .route("/api/trash/:entity/:id/restore", post(restore))
        .with_state(state)
}

#[derive(Debug, Clone, Copy)]
enum TrashEntity {
    Pages,
    Categories,
    Posts,
    Media,
    Folders,
    Users,
}

impl TrashEntity {
    fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "pages" => Ok(TrashEntity::Pages),
            "categories" => Ok(TrashEntity::Categories),
            "posts" => Ok(TrashEntity::Posts),
            "media" => Ok(TrashEntity::Media),
            "folders" => Ok(TrashEntity::Folders),
            "users" => Ok(TrashEntity::Users),
            _ => Err(ApiError::bad_request(format!(
                "unknown trash entity '{}'",
                s
            ))),
        }
    }
}

fn to_json<T: Serialize>(rows: Vec<T>) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(rows)
        .map(Json)
        .map_err(|e| ApiError::new(e.to_string(), "INTERNAL_ERROR"))
}

async fn list(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match TrashEntity::parse(&entity)? {
        TrashEntity::Pages => to_json(state.tree.list_trash(NodeKind::Page).await?),
        TrashEntity::Categories => to_json(state.tree.list_trash(NodeKind::Category).await?),
        TrashEntity::Posts => to_json(state.posts.list_trash().await?),
        TrashEntity::Media => to_json(state.media.list_trash().await?),
        TrashEntity::Folders => to_json(state.folders.list_trash().await?),
        TrashEntity::Users => to_json(state.users.list_trash().await?),
    }
}

async fn restore(
    user: CurrentUser,
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, i64)>,
) -> Result<Json<OkResponse>, ApiError> {
    match TrashEntity::parse(&entity)? {
        TrashEntity::Pages => state.tree.restore(NodeKind::Page, id).await?,
        TrashEntity::Categories => state.tree.restore(NodeKind::Category, id).await?,
        TrashEntity::Posts => {
            state.posts.restore(id).await?;
        }
        TrashEntity::Media => {
            state.media.restore(id).await?;
        }
        TrashEntity::Folders => state.folders.restore(id).await?,
        TrashEntity::Users => {
            user.require_admin()?;
            state.users.restore(id).await?;
        }
    }
    Ok(Json(OK))
}

/// Hard-delete everything currently in the trash, regardless of age.
async fn purge_now(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    user.require_admin()?;
    let now = Utc::now() + chrono::Duration::seconds(1);

    state.tree.purge_expired(now, 0).await?;
    state.posts.purge_expired(now, 0).await?;
    state.media.purge_expired(now, 0).await?;
    state.folders.purge_expired(now, 0).await?;
    state.users.purge_expired(now, 0).await?;

    Ok(Json(OK))
}
