//! User Service
//!
//! Identity rows for the admin backend. Credentials live with the
//! external authentication collaborator; this service manages the
//! username/email/role record and its trash lifecycle.

use crate::db::DatabaseService;
use crate::models::time::{parse_timestamp, to_sqlite};
use crate::models::{User, UserRole};
use crate::services::error::ServiceError;
use chrono::Utc;
use libsql::Connection;
use serde::Deserialize;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, username, email, role, created_at, deleted_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

pub struct UserService {
    db: Arc<DatabaseService>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Create a user. Duplicate usernames are rejected as conflicts.
    pub async fn create(&self, input: NewUser) -> Result<User, ServiceError> {
        let username = input.username.trim();
        let email = input.email.trim();
        if username.is_empty() {
            return Err(ServiceError::validation("username must not be empty"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::validation("email address is not valid"));
        }

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO users (username, email, role) VALUES (?, ?, ?)",
            (username, email, input.role.as_str()),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to insert user", e))?;

        self.get(conn.last_insert_rowid()).await
    }

    pub async fn get(&self, id: i64) -> Result<User, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        match fetch_user(&conn, id).await? {
            Some(u) if u.deleted_at.is_none() => Ok(u),
            _ => Err(ServiceError::not_found("user", id)),
        }
    }

    /// All live users, ordered by username.
    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE deleted_at IS NULL
                     ORDER BY username, id"
                ),
                (),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list users", e))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch user row", e))?
        {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    pub async fn update_role(&self, id: i64, role: UserRole) -> Result<User, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE users SET role = ? WHERE id = ? AND deleted_at IS NULL",
                (role.as_str(), id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to update user role", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("user", id));
        }
        self.get(id).await
    }

    pub async fn soft_delete(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE users SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
                (to_sqlite(Utc::now()).as_str(), id),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to soft-delete user", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("user", id));
        }
        Ok(())
    }

    pub async fn restore(&self, id: i64) -> Result<User, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let updated = conn
            .execute(
                "UPDATE users SET deleted_at = NULL WHERE id = ? AND deleted_at IS NOT NULL",
                [id],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to restore user", e))?;
        if updated == 0 {
            return Err(ServiceError::not_found("user", id));
        }
        self.get(id).await
    }

    /// All soft-deleted users, most recently deleted first.
    pub async fn list_trash(&self) -> Result<Vec<User>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE deleted_at IS NOT NULL
                     ORDER BY deleted_at DESC, id"
                ),
                (),
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list user trash", e))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch user trash row", e))?
        {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Hard-delete users soft-deleted before the retention cutoff.
    /// Authored posts keep their author id; the reference is informational.
    pub async fn purge_expired(
        &self,
        now: chrono::DateTime<Utc>,
        retention_days: i64,
    ) -> Result<u64, ServiceError> {
        let cutoff = to_sqlite(now - chrono::Duration::days(retention_days));
        let conn = self.db.connect_with_timeout().await?;
        let purged = conn
            .execute(
                "DELETE FROM users WHERE deleted_at IS NOT NULL AND deleted_at < ?",
                [cutoff.as_str()],
            )
            .await
            .map_err(|e| ServiceError::from_sql("Failed to purge users", e))?;
        Ok(purged)
    }
}

fn row_to_user(row: &libsql::Row) -> Result<User, ServiceError> {
    let read = |e| ServiceError::from_sql("Failed to read user column", e);
    let role_str: String = row.get(3).map_err(read)?;
    let created_at: String = row.get(4).map_err(read)?;
    let deleted_at: Option<String> = row.get(5).map_err(read)?;

    let role = UserRole::parse(&role_str)
        .ok_or_else(|| ServiceError::validation(format!("unknown user role '{}'", role_str)))?;

    Ok(User {
        id: row.get(0).map_err(read)?,
        username: row.get(1).map_err(read)?,
        email: row.get(2).map_err(read)?,
        role,
        created_at: parse_ts(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
    })
}

fn parse_ts(s: &str) -> Result<chrono::DateTime<Utc>, ServiceError> {
    parse_timestamp(s).map_err(|e| {
        ServiceError::Database(crate::db::DatabaseError::sql_execution(e.to_string()))
    })
}

async fn fetch_user(conn: &Connection, id: i64) -> Result<Option<User>, ServiceError> {
    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            [id],
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch user", e))?;

    match rows
        .next()
        .await
        .map_err(|e| ServiceError::from_sql("Failed to fetch user row", e))?
    {
        Some(row) => Ok(Some(row_to_user(&row)?)),
        None => Ok(None),
    }
}
