//! Ledger error types.

use thiserror::Error;

/// Errors that can occur in cart ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Non-positive quantity passed where a positive one is required.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds the per-row maximum.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Currency mismatch between the cart and a supplied amount.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Negative shipping quote.
    #[error("Negative shipping quote: {0}")]
    NegativeShipping(i64),

    /// Coupon rejected by the validation service.
    #[error("Coupon rejected: {0}")]
    CouponRejected(String),

    /// Coupon validation service could not be reached.
    #[error("Coupon validation unavailable: {0}")]
    CouponUnreachable(String),

    /// A newer coupon request was issued before this one resolved;
    /// its result was discarded without touching the cart.
    #[error("Coupon request superseded by a newer one")]
    CouponSuperseded,
}
