//! Shared utility functions

pub mod slug;

pub use slug::slugify;
