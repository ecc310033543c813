//! Background Scheduler
//!
//! Two recurring sweeps run as independent background tasks:
//!
//! - **Publish sweep**: flips scheduled posts whose publish time has
//!   arrived to published.
//! - **Trash sweep**: hard-deletes soft-deleted rows older than the
//!   retention window, across every trashed entity type.
//!
//! The tick interval and retention window come from settings and are
//! re-read every tick, so changes apply without a restart. A failing
//! sweep is logged and retried on the next tick; one bad tick never
//! stops the loop, and neither loop touches request handling.

use crate::services::folders::FolderService;
use crate::services::media::MediaService;
use crate::services::posts::PostService;
use crate::services::settings::{keys, SettingsProvider};
use crate::services::tree::TreeService;
use crate::services::users::UserService;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

const DEFAULT_TICK_SECONDS: i64 = 60;
const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Everything the sweeps need.
#[derive(Clone)]
pub struct SchedulerContext {
    pub settings: Arc<dyn SettingsProvider>,
    pub tree: Arc<TreeService>,
    pub posts: Arc<PostService>,
    pub media: Arc<MediaService>,
    pub folders: Arc<FolderService>,
    pub users: Arc<UserService>,
}

/// Handle to the running scheduler tasks.
pub struct Scheduler {
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    /// Spawn both sweep loops and return a handle for shutdown.
    pub fn start(context: SchedulerContext) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        spawn_loop(
            "publish",
            context.clone(),
            shutdown_tx.subscribe(),
            |ctx| async move { publish_sweep(&ctx).await },
        );
        spawn_loop(
            "trash",
            context,
            shutdown_tx.subscribe(),
            |ctx| async move { trash_sweep(&ctx).await },
        );

        Self { shutdown_tx }
    }

    /// Stop both loops. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn spawn_loop<F, Fut>(
    name: &'static str,
    context: SchedulerContext,
    mut shutdown_rx: broadcast::Receiver<()>,
    sweep: F,
) where
    F: Fn(SchedulerContext) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        info!(sweep = name, "Scheduler sweep started");
        loop {
            let tick_seconds = context
                .settings
                .get_i64_or(keys::SCHEDULER_TICK_SECONDS, DEFAULT_TICK_SECONDS)
                .await
                .unwrap_or(DEFAULT_TICK_SECONDS)
                .max(1);

            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!(sweep = name, "Scheduler sweep shutting down");
                    break;
                }

                _ = tokio::time::sleep(Duration::from_secs(tick_seconds as u64)) => {
                    sweep(context.clone()).await;
                }
            }
        }
    });
}

/// Promote scheduled posts whose publish time has arrived.
pub async fn publish_sweep(context: &SchedulerContext) {
    match context.posts.publish_due(Utc::now()).await {
        Ok(published) if !published.is_empty() => {
            info!(count = published.len(), "Publish sweep promoted posts");
        }
        Ok(_) => debug!("Publish sweep found nothing due"),
        Err(e) => error!("Publish sweep failed: {}", e),
    }
}

/// Hard-delete expired trash across every entity type. Each entity
/// purge logs its own failure and the others still run.
pub async fn trash_sweep(context: &SchedulerContext) {
    let now = Utc::now();
    let retention_days = match context
        .settings
        .get_i64_or(keys::TRASH_RETENTION_DAYS, DEFAULT_RETENTION_DAYS)
        .await
    {
        Ok(days) => days.max(0),
        Err(e) => {
            error!("Failed to read retention setting: {}", e);
            DEFAULT_RETENTION_DAYS
        }
    };

    let mut purged = 0u64;
    for (entity, result) in [
        ("nodes", context.tree.purge_expired(now, retention_days).await),
        ("posts", context.posts.purge_expired(now, retention_days).await),
        ("media", context.media.purge_expired(now, retention_days).await),
        ("folders", context.folders.purge_expired(now, retention_days).await),
        ("users", context.users.purge_expired(now, retention_days).await),
    ] {
        match result {
            Ok(count) => purged += count,
            Err(e) => error!(entity, "Trash sweep failed: {}", e),
        }
    }
    if purged > 0 {
        info!(purged, "Trash sweep removed expired rows");
    }
}
