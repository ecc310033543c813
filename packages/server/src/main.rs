//! Folio admin server
//!
//! Binds the HTTP admin API and starts the background scheduler.
//! Configuration comes from the environment:
//!
//! - `FOLIO_DB_PATH` - database file (default `./data/folio.db`)
//! - `FOLIO_ADDR` - listen address (default `127.0.0.1:8686`)
//! - `RUST_LOG` - tracing filter (default `info`)

use anyhow::Context;
use folio_core::http::{create_router, AppState};
use folio_core::services::{RestrictedSanitizer, Scheduler, SchedulerContext};
use folio_core::DatabaseService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = std::env::var("FOLIO_DB_PATH").unwrap_or_else(|_| "./data/folio.db".to_string());
    let addr = std::env::var("FOLIO_ADDR").unwrap_or_else(|_| "127.0.0.1:8686".to_string());

    let db = Arc::new(
        DatabaseService::new(PathBuf::from(&db_path))
            .await
            .with_context(|| format!("failed to open database at {}", db_path))?,
    );
    info!(db_path, "Database ready");

    let state = AppState::new(db, Arc::new(RestrictedSanitizer::default()));

    let scheduler = Scheduler::start(SchedulerContext {
        settings: state.settings.clone(),
        tree: state.tree.clone(),
        posts: state.posts.clone(),
        media: state.media.clone(),
        folders: state.folders.clone(),
        users: state.users.clone(),
    });

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr, "Admin API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    scheduler.shutdown();
    Ok(())
}
