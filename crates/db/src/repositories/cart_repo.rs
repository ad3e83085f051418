//! Repository for the `cart_items` table.
//!
//! Carts belong to authenticated users; one row per `(user, product)`.

use folio_core::commerce::MAX_QUANTITY;
use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::cart::{CartItem, CartLine};

const COLUMNS: &str = "id, user_id, product_id, quantity, unit_price_cents, created_at, updated_at";

/// Provides cart operations scoped to one user.
pub struct CartRepo;

impl CartRepo {
    /// The user's cart items joined with their products, oldest first.
    pub async fn list_lines(pool: &PgPool, user_id: DbId) -> Result<Vec<CartLine>, sqlx::Error> {
        sqlx::query_as::<_, CartLine>(
            "SELECT ci.id, ci.product_id, ci.quantity, ci.unit_price_cents,
                    p.title, p.slug, p.image, p.is_active
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.user_id = $1
             ORDER BY ci.created_at, ci.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Add a product, or bump the quantity if it is already in the cart.
    ///
    /// The stored quantity is capped at the per-line maximum and the unit
    /// price is refreshed to the product's current price.
    pub async fn add_item(
        pool: &PgPool,
        user_id: DbId,
        product_id: DbId,
        quantity: i32,
        unit_price_cents: i64,
    ) -> Result<CartItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO cart_items (user_id, product_id, quantity, unit_price_cents)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, {MAX_QUANTITY}),
                unit_price_cents = EXCLUDED.unit_price_cents
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_price_cents)
            .fetch_one(pool)
            .await
    }

    /// Set the quantity of one of the user's items.
    ///
    /// Returns `None` if the item does not exist or belongs to someone else.
    pub async fn update_quantity(
        pool: &PgPool,
        user_id: DbId,
        item_id: DbId,
        quantity: i32,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        let query = format!(
            "UPDATE cart_items SET quantity = $3
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(item_id)
            .bind(user_id)
            .bind(quantity)
            .fetch_optional(pool)
            .await
    }

    pub async fn remove_item(pool: &PgPool, user_id: DbId, item_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the user's cart. Returns the number of items removed.
    pub async fn clear(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
