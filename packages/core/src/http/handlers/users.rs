//! User endpoints. Mutations require the admin role.

use super::nodes::{OkResponse, OK};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::models::{User, UserRole};
use crate::services::users::NewUser;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/:id", get(get_user).delete(soft_delete))
        .route("/api/users/:id/role", put(update_role))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleChange {
    role: UserRole,
}

async fn list(_user: CurrentUser, State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list().await?))
}

async fn get_user(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.get(id).await?))
}

async fn create(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> Result<Json<User>, ApiError> {
    user.require_admin()?;
    Ok(Json(state.users.create(input).await?))
}

async fn update_role(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(change): Json<RoleChange>,
) -> Result<Json<User>, ApiError> {
    user.require_admin()?;
    Ok(Json(state.users.update_role(id, change.role).await?))
}

async fn soft_delete(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    user.require_admin()?;
    if user.id == id {
        return Err(ApiError::bad_request("cannot delete your own account"));
    }
    state.users.soft_delete(id).await?;
    Ok(Json(OK))
}
