//! Shopping cart models.

use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `cart_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartItem {
    pub id: DbId,
    pub user_id: DbId,
    pub product_id: DbId,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A cart item joined with the product it refers to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartLine {
    pub id: DbId,
    pub product_id: DbId,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
    pub is_active: bool,
}

impl CartLine {
    /// Saturates instead of overflowing; checkout re-checks the exact sum.
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents.saturating_mul(i64::from(self.quantity))
    }
}

/// The full cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub total_items: i64,
    pub subtotal_cents: i64,
}

impl Cart {
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let total_items = items.iter().map(|l| i64::from(l.quantity)).sum();
        let subtotal_cents = items
            .iter()
            .map(CartLine::line_total_cents)
            .fold(0i64, i64::saturating_add);
        Self {
            items,
            total_items,
            subtotal_cents,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCartItem {
    pub product_id: DbId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: i32,
}
