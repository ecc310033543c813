//! Per-language translation row for a hierarchical node
//!
//! `full_path` is a derived cache: `/` + the slugs of all ancestors down
//! to and including this node, in one language. It is rebuilt by the tree
//! service whenever an ancestor's slug or parent changes.

use serde::{Deserialize, Serialize};

/// One (node, language) translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub node_id: i64,
    pub language: String,
    pub title: String,
    pub slug: String,
    /// Materialized `/`-joined ancestor slug path; None until first build.
    pub full_path: Option<String>,
    pub body: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}
