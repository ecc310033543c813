//! Data structures for the CMS domain

pub mod media;
pub mod node;
pub mod post;
pub mod tag;
pub mod time;
pub mod translation;
pub mod user;

pub use media::{
    FolderFilter, MediaFolder, MediaItem, MediaPage, MediaQuery, MediaSort, MimeGroup,
    MAX_PAGE_SIZE,
};
pub use node::{Node, NodeKind};
pub use post::{Post, PostStatus, PostTranslation};
pub use tag::Tag;
pub use translation::Translation;
pub use user::{User, UserRole};
