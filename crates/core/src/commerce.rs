//! Cart and order rules: statuses, transitions, totals and order numbers.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Order statuses
// ---------------------------------------------------------------------------

pub mod order_status {
    pub const PENDING: &str = "pending";
    pub const PROCESSING: &str = "processing";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";
    pub const REFUNDED: &str = "refunded";
}

pub const VALID_ORDER_STATUSES: &[&str] = &[
    order_status::PENDING,
    order_status::PROCESSING,
    order_status::COMPLETED,
    order_status::CANCELLED,
    order_status::REFUNDED,
];

pub fn is_valid_order_status(status: &str) -> bool {
    VALID_ORDER_STATUSES.contains(&status)
}

/// Statuses an order in `from` may move to.
pub fn allowed_transitions(from: &str) -> &'static [&'static str] {
    use order_status::*;
    match from {
        PENDING => &[PROCESSING, COMPLETED, CANCELLED],
        PROCESSING => &[COMPLETED, CANCELLED],
        COMPLETED => &[REFUNDED],
        _ => &[],
    }
}

/// Check that an order may move from `from` to `to`.
pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
    if !is_valid_order_status(to) {
        return Err(format!(
            "Invalid order status '{to}'. Must be one of: {}",
            VALID_ORDER_STATUSES.join(", ")
        ));
    }
    if from == to {
        return Err(format!("Order is already '{to}'"));
    }
    if !allowed_transitions(from).contains(&to) {
        return Err(format!("Cannot move order from '{from}' to '{to}'"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Payment statuses
// ---------------------------------------------------------------------------

pub mod payment_status {
    pub const PENDING: &str = "pending";
    pub const PAID: &str = "paid";
    pub const FAILED: &str = "failed";
    pub const REFUNDED: &str = "refunded";
}

pub const VALID_PAYMENT_STATUSES: &[&str] = &[
    payment_status::PENDING,
    payment_status::PAID,
    payment_status::FAILED,
    payment_status::REFUNDED,
];

pub fn validate_payment_status(status: &str) -> Result<(), String> {
    if VALID_PAYMENT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid payment status '{status}'. Must be one of: {}",
            VALID_PAYMENT_STATUSES.join(", ")
        ))
    }
}

// ---------------------------------------------------------------------------
// Quantities and prices
// ---------------------------------------------------------------------------

pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 99;

/// Currency recorded on new orders.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Tax applied at checkout, in basis points. Digital goods carry none.
pub const DEFAULT_TAX_BPS: i64 = 0;

/// Shipping charged at checkout. Digital goods ship for free.
pub const DEFAULT_SHIPPING_CENTS: i64 = 0;

pub fn validate_quantity(quantity: i32) -> Result<(), String> {
    if (MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(format!(
            "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
        ))
    }
}

/// Upper bound for a unit price: one hundred million in major units.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

pub fn validate_price_cents(price_cents: i64) -> Result<(), String> {
    if price_cents < 0 {
        return Err("Price must not be negative".to_string());
    }
    if price_cents > MAX_PRICE_CENTS {
        return Err(format!("Price must not exceed {MAX_PRICE_CENTS} cents"));
    }
    Ok(())
}

/// Order totals in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
}

/// Compute order totals from `(unit_price_cents, quantity)` lines.
///
/// `tax_bps` is the tax rate in basis points; tax is rounded half-up to
/// the nearest cent. Any intermediate amount that does not fit in an
/// `i64` is a validation error.
pub fn compute_totals(
    lines: &[(i64, i32)],
    tax_bps: i64,
    shipping_cents: i64,
) -> Result<OrderTotals, CoreError> {
    let mut subtotal_cents: i64 = 0;
    for &(unit, qty) in lines {
        subtotal_cents = line_total_cents(unit, qty)
            .and_then(|line| subtotal_cents.checked_add(line))
            .ok_or_else(too_large)?;
    }
    let tax_cents = subtotal_cents
        .checked_mul(tax_bps)
        .and_then(|t| t.checked_add(5_000))
        .map(|t| t / 10_000)
        .ok_or_else(too_large)?;
    let total_cents = subtotal_cents
        .checked_add(tax_cents)
        .and_then(|t| t.checked_add(shipping_cents))
        .ok_or_else(too_large)?;
    Ok(OrderTotals {
        subtotal_cents,
        tax_cents,
        shipping_cents,
        total_cents,
    })
}

/// `unit * quantity`, or `None` on overflow.
pub fn line_total_cents(unit_price_cents: i64, quantity: i32) -> Option<i64> {
    unit_price_cents.checked_mul(i64::from(quantity))
}

fn too_large() -> CoreError {
    CoreError::Validation("Order total is too large".to_string())
}

// ---------------------------------------------------------------------------
// Order numbers
// ---------------------------------------------------------------------------

const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// `ORD-YYYYMMDD-XXXXXX` from a date and a suffix.
pub fn format_order_number(now: Timestamp, suffix: &str) -> String {
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase())
}

/// A fresh order number with a random alphanumeric suffix.
pub fn generate_order_number(now: Timestamp) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_NUMBER_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format_order_number(now, &suffix)
}
