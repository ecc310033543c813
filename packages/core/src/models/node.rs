//! Hierarchical content node (page or category)
//!
//! Pages and categories share the same forest structure: a parent pointer,
//! a dense zero-based `order_index` among live siblings, and a soft-delete
//! marker. Per-language data lives in [`crate::models::Translation`] rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which tree a node belongs to. Pages and categories never mix parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Page,
    Category,
}

impl NodeKind {
    /// Database representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Page => "page",
            NodeKind::Category => "category",
        }
    }

    /// Parse the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "page" => Some(NodeKind::Page),
            "category" => Some(NodeKind::Category),
            _ => None,
        }
    }
}

/// A node in the page or category forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i64,
    pub kind: NodeKind,
    /// None for root-level nodes.
    pub parent_id: Option<i64>,
    /// Dense zero-based rank among live siblings.
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; set rows are excluded from tree traversal.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Node {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(NodeKind::parse("page"), Some(NodeKind::Page));
        assert_eq!(NodeKind::parse("category"), Some(NodeKind::Category));
        assert_eq!(NodeKind::parse(NodeKind::Page.as_str()), Some(NodeKind::Page));
        assert_eq!(NodeKind::parse("post"), None);
    }
}
