//! Media library models and DTOs.

use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default `source` for media records.
pub const DEFAULT_SOURCE: &str = "general";

/// A row from the `media_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaFile {
    pub id: DbId,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub source: String,
    pub folder_path: Option<String>,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Metadata for a file already placed in storage.
#[derive(Debug, Deserialize)]
pub struct CreateMediaFile {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub folder_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMediaFile {
    pub original_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub folder_path: Option<String>,
}
