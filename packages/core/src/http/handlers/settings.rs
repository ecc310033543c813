//! Settings endpoints. Writes require the admin role.

use super::nodes::{OkResponse, OK};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::services::SettingsProvider;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/settings", get(list))
        .route("/api/settings/:key", get(get_setting).put(set_setting))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct SettingValue {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SettingInput {
    value: String,
}

async fn list(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(state.settings.list_all().await?))
}

async fn get_setting(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SettingValue>, ApiError> {
    match state.settings.get(&key).await? {
        Some(value) => Ok(Json(SettingValue { key, value })),
        None => Err(ApiError::new(
            format!("setting '{}' not found", key),
            "NOT_FOUND",
        )),
    }
}

async fn set_setting(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<SettingInput>,
) -> Result<Json<OkResponse>, ApiError> {
    user.require_admin()?;
    state.settings.set(&key, &input.value).await?;
    Ok(Json(OK))
}
