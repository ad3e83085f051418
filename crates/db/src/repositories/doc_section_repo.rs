//! Repository for the `doc_sections` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::documentation::{CreateDocSection, DocSection, UpdateDocSection};
use crate::models::ReorderItem;

const COLUMNS: &str = "id, title, slug, description, parent_id, sort_order, is_active, \
                       created_at, updated_at";

/// Provides CRUD operations for documentation sections.
pub struct DocSectionRepo;

impl DocSectionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDocSection,
        slug: &str,
    ) -> Result<DocSection, sqlx::Error> {
        let query = format!(
            "INSERT INTO doc_sections (title, slug, description, parent_id, sort_order, is_active)
             VALUES ($1, $2, $3, $4, COALESCE($5, 0), COALESCE($6, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocSection>(&query)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocSection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM doc_sections WHERE id = $1");
        sqlx::query_as::<_, DocSection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<DocSection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM doc_sections
             WHERE ($1 OR is_active = true)
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, DocSection>(&query)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocSection,
    ) -> Result<Option<DocSection>, sqlx::Error> {
        let query = format!(
            "UPDATE doc_sections SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                parent_id = COALESCE($5, parent_id),
                sort_order = COALESCE($6, sort_order),
                is_active = COALESCE($7, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocSection>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a section together with its contents.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM doc_sections WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn reorder(pool: &PgPool, items: &[ReorderItem]) -> Result<u64, sqlx::Error> {
        super::reorder_rows(pool, "doc_sections", items).await
    }
}
