//! Media library entities and the media query definition
//!
//! Media rows are flat; folders form a parent-pointer tree with
//! many-to-many file assignment through `media_folder_items`. Folders are
//! navigational only and carry no materialized path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded file registered in the media library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A folder in the media tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFolder {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Coarse MIME filter matched by type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeGroup {
    Image,
    Video,
    Doc,
}

impl MimeGroup {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MimeGroup::Image),
            "video" => Some(MimeGroup::Video),
            "doc" => Some(MimeGroup::Doc),
            _ => None,
        }
    }
}

/// Folder scope of a media listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderFilter {
    /// No folder constraint.
    #[default]
    All,
    /// Only files with no folder assignment at all.
    Unassigned,
    /// Files assigned to this folder via the join table.
    Folder(i64),
}

/// Fixed sort keys for media listings.
///
/// Every variant's ORDER BY clause ends with an `id` tie-break so repeated
/// queries paginate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSort {
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
    CreatedAsc,
    #[default]
    CreatedDesc,
}

impl MediaSort {
    /// ORDER BY clause for this sort key, including the id tie-break.
    pub fn order_clause(&self) -> &'static str {
        match self {
            MediaSort::NameAsc => "ORDER BY m.filename ASC, m.id ASC",
            MediaSort::NameDesc => "ORDER BY m.filename DESC, m.id ASC",
            MediaSort::SizeAsc => "ORDER BY m.size_bytes ASC, m.id ASC",
            MediaSort::SizeDesc => "ORDER BY m.size_bytes DESC, m.id ASC",
            MediaSort::CreatedAsc => "ORDER BY m.created_at ASC, m.id ASC",
            MediaSort::CreatedDesc => "ORDER BY m.created_at DESC, m.id ASC",
        }
    }

    /// Parse a `sort`/`dir` query-string pair.
    pub fn parse(sort: &str, dir: &str) -> Option<Self> {
        let descending = dir.eq_ignore_ascii_case("desc");
        match sort {
            "name" => Some(if descending {
                MediaSort::NameDesc
            } else {
                MediaSort::NameAsc
            }),
            "size" => Some(if descending {
                MediaSort::SizeDesc
            } else {
                MediaSort::SizeAsc
            }),
            "created" => Some(if descending {
                MediaSort::CreatedDesc
            } else {
                MediaSort::CreatedAsc
            }),
            _ => None,
        }
    }
}

/// Hard cap on page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A filtered, paginated media listing request.
#[derive(Debug, Clone, Default)]
pub struct MediaQuery {
    pub folder: FolderFilter,
    /// Case-insensitive substring match on filename, original name, URL.
    pub text: Option<String>,
    pub mime_group: Option<MimeGroup>,
    pub sort: MediaSort,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u32,
    /// Clamped to `1..=MAX_PAGE_SIZE`.
    pub page_size: u32,
}

impl MediaQuery {
    /// Effective page after normalization.
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Effective page size after clamping.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of media results plus the total match count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPage {
    pub items: Vec<MediaItem>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        assert_eq!(MediaSort::parse("name", "asc"), Some(MediaSort::NameAsc));
        assert_eq!(MediaSort::parse("size", "DESC"), Some(MediaSort::SizeDesc));
        assert_eq!(MediaSort::parse("created", ""), Some(MediaSort::CreatedAsc));
        assert_eq!(MediaSort::parse("random", "asc"), None);
    }

    #[test]
    fn test_every_order_clause_breaks_ties_on_id() {
        for sort in [
            MediaSort::NameAsc,
            MediaSort::NameDesc,
            MediaSort::SizeAsc,
            MediaSort::SizeDesc,
            MediaSort::CreatedAsc,
            MediaSort::CreatedDesc,
        ] {
            assert!(sort.order_clause().ends_with("m.id ASC"));
        }
    }

    #[test]
    fn test_page_size_clamping() {
        let query = MediaQuery {
            page: 0,
            page_size: 5000,
            ..Default::default()
        };
        assert_eq!(query.effective_page(), 1);
        assert_eq!(query.effective_page_size(), MAX_PAGE_SIZE);
    }
}
