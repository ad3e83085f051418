//! Repository for the `media_files` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::media::{CreateMediaFile, MediaFile, UpdateMediaFile, DEFAULT_SOURCE};

const COLUMNS: &str = "id, filename, original_name, mime_type, size_bytes, url, thumbnail_url, \
                       category, source, folder_path, uploaded_by, created_at, updated_at";

/// Provides CRUD operations for media library records.
pub struct MediaFileRepo;

impl MediaFileRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateMediaFile,
        uploaded_by: DbId,
    ) -> Result<MediaFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_files
                (filename, original_name, mime_type, size_bytes, url, thumbnail_url,
                 category, source, folder_path, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(&input.filename)
            .bind(&input.original_name)
            .bind(&input.mime_type)
            .bind(input.size_bytes)
            .bind(&input.url)
            .bind(&input.thumbnail_url)
            .bind(&input.category)
            .bind(input.source.as_deref().unwrap_or(DEFAULT_SOURCE))
            .bind(&input.folder_path)
            .bind(uploaded_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MediaFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_files WHERE id = $1");
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List media, newest first, optionally filtered by category and source.
    pub async fn list(
        pool: &PgPool,
        category: Option<&str>,
        source: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media_files
             WHERE ($1::TEXT IS NULL OR category = $1)
               AND ($2::TEXT IS NULL OR source = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(category)
            .bind(source)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMediaFile,
    ) -> Result<Option<MediaFile>, sqlx::Error> {
        let query = format!(
            "UPDATE media_files SET
                original_name = COALESCE($2, original_name),
                thumbnail_url = COALESCE($3, thumbnail_url),
                category = COALESCE($4, category),
                source = COALESCE($5, source),
                folder_path = COALESCE($6, folder_path)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(id)
            .bind(&input.original_name)
            .bind(&input.thumbnail_url)
            .bind(&input.category)
            .bind(&input.source)
            .bind(&input.folder_path)
            .fetch_optional(pool)
            .await
    }

    /// Delete a record, returning it so callers can announce what was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<MediaFile>, sqlx::Error> {
        let query = format!("DELETE FROM media_files WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
