//! Repository for the `product_categories` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::product::{CreateProductCategory, ProductCategory, UpdateProductCategory};

const COLUMNS: &str = "id, name, slug, description, parent_id, sort_order, is_active, \
                       created_at, updated_at";

/// Provides CRUD operations for product categories.
pub struct ProductCategoryRepo;

impl ProductCategoryRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateProductCategory,
        slug: &str,
    ) -> Result<ProductCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_categories
                (name, slug, description, parent_id, sort_order, is_active)
             VALUES ($1, $2, $3, $4, COALESCE($5, 0), COALESCE($6, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ProductCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM product_categories WHERE id = $1");
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All categories in display order. Inactive ones only when asked for.
    pub async fn list(
        pool: &PgPool,
        include_inactive: bool,
    ) -> Result<Vec<ProductCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_categories
             WHERE ($1 OR is_active = true)
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProductCategory,
    ) -> Result<Option<ProductCategory>, sqlx::Error> {
        let query = format!(
            "UPDATE product_categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                parent_id = COALESCE($5, parent_id),
                sort_order = COALESCE($6, sort_order),
                is_active = COALESCE($7, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Number of products filed under the category.
    pub async fn count_products(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
