//! HTTP admin API
//!
//! A thin axum shell over the service layer: per-resource routers merged
//! under `/api`, shared [`AppState`], JSON errors, request tracing.
//! Authentication is upstream; see [`auth::CurrentUser`].

use crate::db::DatabaseService;
use crate::services::{
    DbSettings, FolderService, HtmlSanitizer, MediaService, PostService, TagService, TreeService,
    UserService,
};
use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod handlers;

pub use auth::CurrentUser;
pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseService>,
    pub settings: Arc<DbSettings>,
    pub tree: Arc<TreeService>,
    pub posts: Arc<PostService>,
    pub tags: Arc<TagService>,
    pub media: Arc<MediaService>,
    pub folders: Arc<FolderService>,
    pub users: Arc<UserService>,
}

impl AppState {
    /// Wire the full service graph over one database handle.
    pub fn new(db: Arc<DatabaseService>, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        Self {
            settings: Arc::new(DbSettings::new(db.clone())),
            tree: Arc::new(TreeService::new(db.clone(), sanitizer.clone())),
            posts: Arc::new(PostService::new(db.clone(), sanitizer)),
            tags: Arc::new(TagService::new(db.clone())),
            media: Arc::new(MediaService::new(db.clone())),
            folders: Arc::new(FolderService::new(db.clone())),
            users: Arc::new(UserService::new(db.clone())),
            db,
        }
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the admin API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(handlers::pages::routes(state.clone()))
        .merge(handlers::categories::routes(state.clone()))
        .merge(handlers::posts::routes(state.clone()))
        .merge(handlers::tags::routes(state.clone()))
        .merge(handlers::media::routes(state.clone()))
        .merge(handlers::folders::routes(state.clone()))
        .merge(handlers::users::routes(state.clone()))
        .merge(handlers::settings::routes(state.clone()))
        .merge(handlers::trash::routes(state))
        .layer(TraceLayer::new_for_http())
}
