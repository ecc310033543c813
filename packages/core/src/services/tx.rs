//! Explicit transaction helpers
//!
//! Multi-statement mutations run as explicit `BEGIN TRANSACTION` /
//! `COMMIT` / `ROLLBACK` statements on a single connection. Services
//! call `begin`, run their statements, and finish with `commit` or
//! `rollback`; any error between begin and commit must roll back so no
//! partial state is ever visible.

use crate::services::error::ServiceError;
use libsql::Connection;
use tracing::warn;

pub(crate) async fn begin(conn: &Connection) -> Result<(), ServiceError> {
    conn.execute("BEGIN TRANSACTION", ())
        .await
        .map_err(|e| ServiceError::transaction(format!("begin failed: {}", e)))?;
    Ok(())
}

pub(crate) async fn commit(conn: &Connection) -> Result<(), ServiceError> {
    conn.execute("COMMIT", ())
        .await
        .map_err(|e| ServiceError::transaction(format!("commit failed: {}", e)))?;
    Ok(())
}

pub(crate) async fn rollback(conn: &Connection) {
    if let Err(e) = conn.execute("ROLLBACK", ()).await {
        warn!("Rollback failed: {}", e);
    }
}
