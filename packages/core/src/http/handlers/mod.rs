//! Per-resource endpoint modules, merged by [`super::create_router`].

pub mod categories;
pub mod folders;
pub mod media;
mod nodes;
pub mod pages;
pub mod posts;
pub mod settings;
pub mod tags;
pub mod trash;
pub mod users;
