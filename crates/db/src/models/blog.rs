//! Blog category and post models and DTOs.

use folio_core::tree::TreeItem;
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A row from the `blog_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlogCategory {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TreeItem for BlogCategory {
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
pub struct CreateBlogCategory {
    pub name: String,
    /// Generated from `name` when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBlogCategory {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// A row from the `blog_posts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlogPost {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: Option<DbId>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub project_url: Option<String>,
    pub technologies: Vec<String>,
    pub tags: Vec<String>,
    pub slug: String,
    pub status: String,
    pub author_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateBlogPost {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    pub category_id: Option<DbId>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub project_url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Generated from `title` when absent.
    pub slug: Option<String>,
    /// Defaults to `draft`.
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBlogPost {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<DbId>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub project_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub slug: Option<String>,
    pub status: Option<String>,
}

/// Filters for listing posts.
#[derive(Debug, Default, Clone)]
pub struct BlogPostFilter {
    pub status: Option<String>,
    pub category_id: Option<DbId>,
    pub limit: i64,
    pub offset: i64,
}
