//! Repository for the `products` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::product::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repositories::blog_post_repo::escape_like;

const COLUMNS: &str = "id, title, description, content, price_cents, image, slug, category_id, \
                       features, is_active, sort_order, created_at, updated_at";

/// Provides CRUD and search operations for products.
pub struct ProductRepo;

impl ProductRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateProduct,
        slug: &str,
    ) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products
                (title, description, content, price_cents, image, slug, category_id,
                 features, is_active, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, '[]'::jsonb),
                     COALESCE($9, true), COALESCE($10, 0))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(input.price_cents)
            .bind(&input.image)
            .bind(slug)
            .bind(input.category_id)
            .bind(&input.features)
            .bind(input.is_active)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE slug = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List products in catalog order.
    pub async fn list(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE ($1::BIGINT IS NULL OR category_id = $1)
               AND ($2 OR is_active = true)
             ORDER BY sort_order, created_at DESC, id
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(filter.category_id)
            .bind(filter.include_inactive)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Case-insensitive search over active products' title and description.
    pub async fn search(pool: &PgPool, q: &str, limit: i64) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE is_active = true
               AND (title ILIKE $1 OR description ILIKE $1)
             ORDER BY sort_order, id
             LIMIT $2"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(format!("%{}%", escape_like(q)))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                content = COALESCE($4, content),
                price_cents = COALESCE($5, price_cents),
                image = COALESCE($6, image),
                slug = COALESCE($7, slug),
                category_id = COALESCE($8, category_id),
                features = COALESCE($9, features),
                is_active = COALESCE($10, is_active),
                sort_order = COALESCE($11, sort_order)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(input.price_cents)
            .bind(&input.image)
            .bind(&input.slug)
            .bind(input.category_id)
            .bind(&input.features)
            .bind(input.is_active)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
