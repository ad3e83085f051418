//! Product catalog models and DTOs.

use folio_core::tree::TreeItem;
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A row from the `product_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductCategory {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TreeItem for ProductCategory {
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
pub struct CreateProductCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductCategory {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub price_cents: i64,
    pub image: Option<String>,
    pub slug: String,
    pub category_id: Option<DbId>,
    pub features: serde_json::Value,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub price_cents: i64,
    pub image: Option<String>,
    pub slug: Option<String>,
    pub category_id: Option<DbId>,
    pub features: Option<serde_json::Value>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub price_cents: Option<i64>,
    pub image: Option<String>,
    pub slug: Option<String>,
    pub category_id: Option<DbId>,
    pub features: Option<serde_json::Value>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Filters for listing products.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub category_id: Option<DbId>,
    pub include_inactive: bool,
    pub limit: i64,
    pub offset: i64,
}
