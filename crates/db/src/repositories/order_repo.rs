//! Repository for the `orders` and `order_items` tables.

use folio_core::commerce::{self, order_status, payment_status};
use folio_core::error::CoreError;
use folio_core::types::DbId;
use serde_json::json;
use sqlx::{FromRow, PgPool};

use crate::models::order::{CreateOrder, Order, OrderItem, OrderWithItems};

const COLUMNS: &str = "id, user_id, order_number, status, payment_status, payment_method, \
                       customer_name, customer_email, customer_phone, shipping_address, \
                       billing_address, subtotal_cents, tax_cents, shipping_cents, total_cents, \
                       currency, notes, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents, total_cents, \
                            product_snapshot, created_at";

/// A cart row locked for checkout.
#[derive(FromRow)]
struct CheckoutLine {
    cart_item_id: DbId,
    product_id: DbId,
    quantity: i32,
    unit_price_cents: i64,
    title: String,
    slug: String,
    image: Option<String>,
}

/// Why a checkout could not be written.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The cart's amounts do not fit the order columns.
    #[error(transparent)]
    Totals(#[from] CoreError),
}

/// Pricing applied when turning a cart into an order.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutPricing {
    pub tax_bps: i64,
    pub shipping_cents: i64,
}

impl Default for CheckoutPricing {
    fn default() -> Self {
        Self {
            tax_bps: commerce::DEFAULT_TAX_BPS,
            shipping_cents: commerce::DEFAULT_SHIPPING_CENTS,
        }
    }
}

/// Provides order creation, lookup and status updates.
pub struct OrderRepo;

impl OrderRepo {
    /// Turn the user's cart into an order in one transaction.
    ///
    /// Cart rows for active products are locked, copied into `order_items`
    /// with a product snapshot, and removed from the cart. Returns `None`
    /// when the cart holds no orderable items.
    pub async fn create_from_cart(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateOrder,
        order_number: &str,
        pricing: CheckoutPricing,
    ) -> Result<Option<OrderWithItems>, CheckoutError> {
        let mut tx = pool.begin().await?;

        let lines = sqlx::query_as::<_, CheckoutLine>(
            "SELECT ci.id AS cart_item_id, ci.product_id, ci.quantity, ci.unit_price_cents,
                    p.title, p.slug, p.image
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.user_id = $1 AND p.is_active = true
             ORDER BY ci.created_at, ci.id
             FOR UPDATE OF ci",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }

        let priced: Vec<(i64, i32)> = lines
            .iter()
            .map(|l| (l.unit_price_cents, l.quantity))
            .collect();
        // Dropping `tx` on an early return rolls the row locks back.
        let totals = commerce::compute_totals(&priced, pricing.tax_bps, pricing.shipping_cents)?;

        let order_query = format!(
            "INSERT INTO orders
                (user_id, order_number, status, payment_status, payment_method,
                 customer_name, customer_email, customer_phone, shipping_address,
                 billing_address, subtotal_cents, tax_cents, shipping_cents, total_cents,
                 currency, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&order_query)
            .bind(user_id)
            .bind(order_number)
            .bind(order_status::PENDING)
            .bind(payment_status::PENDING)
            .bind(&input.payment_method)
            .bind(&input.customer_name)
            .bind(&input.customer_email)
            .bind(&input.customer_phone)
            .bind(&input.shipping_address)
            .bind(&input.billing_address)
            .bind(totals.subtotal_cents)
            .bind(totals.tax_cents)
            .bind(totals.shipping_cents)
            .bind(totals.total_cents)
            .bind(commerce::DEFAULT_CURRENCY)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO order_items
                (order_id, product_id, quantity, unit_price_cents, total_cents, product_snapshot)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let line_total = commerce::line_total_cents(line.unit_price_cents, line.quantity)
                .ok_or_else(|| CoreError::Validation("Order line total is too large".into()))?;
            let snapshot = json!({
                "id": line.product_id,
                "title": line.title,
                "slug": line.slug,
                "image": line.image,
                "price_cents": line.unit_price_cents,
            });
            let item = sqlx::query_as::<_, OrderItem>(&item_query)
                .bind(order.id)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(line.unit_price_cents)
                .bind(line_total)
                .bind(snapshot)
                .fetch_one(&mut *tx)
                .await?;
            items.push(item);
        }

        let ordered_ids: Vec<DbId> = lines.iter().map(|l| l.cart_item_id).collect();
        sqlx::query("DELETE FROM cart_items WHERE id = ANY($1)")
            .bind(&ordered_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_number(
        pool: &PgPool,
        order_number: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE order_number = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(order_number)
            .fetch_optional(pool)
            .await
    }

    /// Orders newest first. `user_id = None` lists every order.
    pub async fn list(
        pool: &PgPool,
        user_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn items(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Move an order from `from_status` to `to_status`.
    ///
    /// The `from_status` guard makes concurrent transitions safe: returns
    /// `None` if the order no longer has the expected status.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        from_status: &str,
        to_status: &str,
        new_payment_status: Option<&str>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET
                status = $3,
                payment_status = COALESCE($4, payment_status)
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(from_status)
            .bind(to_status)
            .bind(new_payment_status)
            .fetch_optional(pool)
            .await
    }
}
