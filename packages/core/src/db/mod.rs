//! Database layer: libsql connection management, versioned schema
//! migrations, and database error types.

pub mod database;
pub mod error;
pub mod migrations;

pub use database::DatabaseService;
pub use error::DatabaseError;
