//! Media library endpoints
//!
//! `GET /api/media` takes the full filter surface as query parameters:
//! `folder` (`all`, `unassigned`, or a folder id), `q` (text search),
//! `type` (`image`/`video`/`doc`), `sort` (`name`/`size`/`created`),
//! `dir` (`asc`/`desc`), `page`, `pageSize`.

use super::nodes::{OkResponse, OK};
use crate::http::{ApiError, AppState, CurrentUser};
use crate::models::{FolderFilter, MediaItem, MediaPage, MediaQuery, MediaSort, MimeGroup};
use crate::services::media::NewMedia;
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/media", get(list).post(register))
        .route("/api/media/:id", get(get_media).delete(soft_delete))
        .route("/api/media/:id/rename", put(rename))
        .route("/api/media/:id/restore", post(restore))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    folder: Option<String>,
    q: Option<String>,
    #[serde(rename = "type")]
    mime_type: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl ListParams {
    fn into_query(self) -> Result<MediaQuery, ApiError> {
        let folder = match self.folder.as_deref() {
            None | Some("all") => FolderFilter::All,
            Some("unassigned") => FolderFilter::Unassigned,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => FolderFilter::Folder(id),
                Err(_) => {
                    return Err(ApiError::bad_request(format!(
                        "invalid folder filter '{}'",
                        raw
                    )))
                }
            },
        };

        let mime_group = match self.mime_type.as_deref() {
            None => None,
            Some(raw) => Some(MimeGroup::parse(raw).ok_or_else(|| {
                ApiError::bad_request(format!("invalid media type filter '{}'", raw))
            })?),
        };

        let sort = match self.sort.as_deref() {
            None => MediaSort::default(),
            Some(raw) => {
                MediaSort::parse(raw, self.dir.as_deref().unwrap_or("asc")).ok_or_else(|| {
                    ApiError::bad_request(format!("invalid sort key '{}'", raw))
                })?
            }
        };

        Ok(MediaQuery {
            folder,
            text: self.q,
            mime_group,
            sort,
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(25),
        })
    }
}

async fn list(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<MediaPage>, ApiError> {
    let query = params.into_query()?;
    Ok(Json(state.media.list(&query).await?))
}

async fn register(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<NewMedia>,
) -> Result<Json<MediaItem>, ApiError> {
    Ok(Json(state.media.register(input).await?))
}

async fn get_media(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MediaItem>, ApiError> {
    Ok(Json(state.media.get(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameInput {
    name: String,
}

async fn rename(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<RenameInput>,
) -> Result<Json<MediaItem>, ApiError> {
    Ok(Json(state.media.rename(id, &input.name).await?))
}

async fn soft_delete(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    state.media.soft_delete(id).await?;
    Ok(Json(OK))
}

async fn restore(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MediaItem>, ApiError> {
    Ok(Json(state.media.restore(id).await?))
}
