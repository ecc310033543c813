//! Folio Core - multilingual content management backend
//!
//! This crate provides the data model, content services, and HTTP admin
//! API for the Folio publishing system.
//!
//! # Architecture
//!
//! - **Parent-pointer trees**: pages, categories, and media folders are
//!   forests over `parent_id` with dense sibling ordering
//! - **Materialized paths**: each (page, language) pair caches its full
//!   URL path, rebuilt on structural changes
//! - **Soft-delete everywhere**: deletions move rows to the trash; a
//!   background sweep purges them after the retention window
//! - **libsql/Turso**: embedded SQLite with versioned startup migrations
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Post, MediaItem, User, etc.)
//! - [`services`] - Business services (TreeService, MediaService, etc.)
//! - [`db`] - Database layer with libsql integration
//! - [`http`] - axum admin API
//! - [`utils`] - Slug generation helpers

pub mod models;
pub mod services;
pub mod db;
pub mod http;
pub mod utils;

// Re-export commonly used types
pub use db::{DatabaseError, DatabaseService};
pub use models::*;
pub use services::ServiceError;
