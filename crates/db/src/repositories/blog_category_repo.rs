//! Repository for the `blog_categories` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::blog::{BlogCategory, CreateBlogCategory, UpdateBlogCategory};

const COLUMNS: &str = "id, name, slug, description, parent_id, sort_order, created_at, updated_at";

/// Provides CRUD operations for blog categories.
pub struct BlogCategoryRepo;

impl BlogCategoryRepo {
    /// Insert a category. `slug` is already resolved by the caller.
    pub async fn create(
        pool: &PgPool,
        input: &CreateBlogCategory,
        slug: &str,
    ) -> Result<BlogCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO blog_categories (name, slug, description, parent_id, sort_order)
             VALUES ($1, $2, $3, $4, COALESCE($5, 0))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlogCategory>(&query)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BlogCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blog_categories WHERE id = $1");
        sqlx::query_as::<_, BlogCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All categories, flat, in display order.
    pub async fn list(pool: &PgPool) -> Result<Vec<BlogCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blog_categories ORDER BY sort_order, id");
        sqlx::query_as::<_, BlogCategory>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBlogCategory,
    ) -> Result<Option<BlogCategory>, sqlx::Error> {
        let query = format!(
            "UPDATE blog_categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                parent_id = COALESCE($5, parent_id),
                sort_order = COALESCE($6, sort_order)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlogCategory>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_children(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Delete a category. Posts in it keep existing with no category.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blog_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
