//! Documentation library models and DTOs.

use folio_core::tree::TreeItem;
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Library used when a content item does not name one.
pub const DEFAULT_LIBRARY_TYPE: &str = "general";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// A row from the `doc_sections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocSection {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TreeItem for DocSection {
    fn id(&self) -> DbId {
        self.id
    }
    fn parent_id(&self) -> Option<DbId> {
        self.parent_id
    }
    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDocSection {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDocSection {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// A row from the `doc_contents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocContent {
    pub id: DbId,
    pub section_id: DbId,
    pub library_type: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub author_id: Option<DbId>,
    pub sort_order: i32,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocContent {
    pub section_id: DbId,
    pub library_type: Option<String>,
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_published: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDocContent {
    pub section_id: Option<DbId>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
    pub sort_order: Option<i32>,
    /// Recorded on the version row when `content` changes.
    pub change_log: Option<String>,
}

/// Filters for listing contents.
#[derive(Debug, Default, Clone)]
pub struct DocContentFilter {
    pub section_id: Option<DbId>,
    pub library_type: Option<String>,
    pub published_only: bool,
    pub limit: i64,
    pub offset: i64,
}

/// A row from the `doc_content_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocContentVersion {
    pub id: DbId,
    pub content_id: DbId,
    pub version: i32,
    pub title: String,
    pub content: String,
    pub change_log: Option<String>,
    pub author_id: Option<DbId>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

/// A row from the `doc_menu_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocMenuItem {
    pub id: DbId,
    pub title: String,
    pub url: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TreeItem for DocMenuItem {
    fn id(&self) -> DbId {
        self.id
    }
    fn parent_id(&self) -> Option<DbId> {
        self.parent_id
    }
    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDocMenuItem {
    pub title: String,
    pub url: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDocMenuItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
