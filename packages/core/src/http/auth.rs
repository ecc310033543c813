//! Request identity
//!
//! Authentication happens upstream (reverse proxy or gateway); handlers
//! trust the `x-user-id` and `x-user-role` headers it injects. The
//! extractor rejects requests without a valid identity, and admin-only
//! routes call [`CurrentUser::require_admin`].

use crate::http::error::ApiError;
use crate::models::UserRole;
use axum::{extract::FromRequestParts, http::request::Parts};

#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("admin role required"))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| ApiError::unauthorized("missing or invalid x-user-id header"))?;

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .and_then(UserRole::parse)
            .ok_or_else(|| ApiError::unauthorized("missing or invalid x-user-role header"))?;

        Ok(CurrentUser { id, role })
    }
}
