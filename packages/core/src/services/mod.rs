//! Service layer: all content operations behind typed APIs
//!
//! Services own the business rules (tree structure, soft-delete
//! lifecycle, slug/path maintenance, scheduling) and talk to the
//! database through explicit SQL on pooled connections. The HTTP layer
//! is a thin shell over these types.

pub mod error;
pub mod folders;
pub mod media;
pub mod path;
pub mod posts;
pub mod sanitize;
pub mod scheduler;
pub mod settings;
pub mod tree;
pub mod users;

mod tx;

pub use error::ServiceError;
pub use folders::{FolderMove, FolderService};
pub use media::{MediaService, NewMedia};
pub use path::{build_full_path, PathBuild};
pub use posts::{NewPost, PostDetail, PostService, PostTranslationUpdate, TagService};
pub use sanitize::{HtmlSanitizer, RestrictedSanitizer};
pub use scheduler::{publish_sweep, trash_sweep, Scheduler, SchedulerContext};
pub use settings::{DbSettings, SettingsProvider};
pub use tree::{
    ChangedPaths, NewNode, NodeDetail, ReorderRequest, TranslationUpdate, TreeService,
};
pub use users::{NewUser, UserService};
