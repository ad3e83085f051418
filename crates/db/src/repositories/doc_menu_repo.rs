//! Repository for the `doc_menu_items` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::documentation::{CreateDocMenuItem, DocMenuItem, UpdateDocMenuItem};
use crate::models::ReorderItem;

const COLUMNS: &str = "id, title, url, parent_id, sort_order, is_active, created_at, updated_at";

/// Provides CRUD operations for documentation navigation.
pub struct DocMenuRepo;

impl DocMenuRepo {
    pub async fn create(pool: &PgPool, input: &CreateDocMenuItem) -> Result<DocMenuItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO doc_menu_items (title, url, parent_id, sort_order, is_active)
             VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocMenuItem>(&query)
            .bind(&input.title)
            .bind(&input.url)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocMenuItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM doc_menu_items WHERE id = $1");
        sqlx::query_as::<_, DocMenuItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<DocMenuItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM doc_menu_items
             WHERE ($1 OR is_active = true)
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, DocMenuItem>(&query)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocMenuItem,
    ) -> Result<Option<DocMenuItem>, sqlx::Error> {
        let query = format!(
            "UPDATE doc_menu_items SET
                title = COALESCE($2, title),
                url = COALESCE($3, url),
                parent_id = COALESCE($4, parent_id),
                sort_order = COALESCE($5, sort_order),
                is_active = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocMenuItem>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.url)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM doc_menu_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn reorder(pool: &PgPool, items: &[ReorderItem]) -> Result<u64, sqlx::Error> {
        super::reorder_rows(pool, "doc_menu_items", items).await
    }
}
