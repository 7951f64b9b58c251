//! Cart pricing and coupon engine for storefront checkout.
//!
//! The crate owns one thing: the **cart ledger**, a reducer over a
//! shopping cart that keeps the five derived monetary fields
//! (subtotal, discount, tax, shipping, total) mutually consistent
//! under every mutation. Rendering, persistence media, payment and
//! order creation are external collaborators reached through plain
//! data contracts.
//!
//! - **Cart**: line items, full rederivation on every mutation,
//!   race-safe coupon application against an async validation service
//! - **Order**: snapshot-derived payload for order submission
//! - **Persist**: minimal stored shape, totals recomputed on load
//!
//! # Example
//!
//! ```rust
//! use cart_ledger::prelude::*;
//!
//! let mut cart = CartLedger::new(Currency::INR);
//! cart.add_item(ProductRef::new("sku-1"), Money::from_major(1000.0, Currency::INR), 1)?;
//! cart.update_shipping(Money::from_major(50.0, Currency::INR))?;
//!
//! let totals = cart.totals();
//! assert_eq!(totals.tax, Money::from_major(180.0, Currency::INR));
//! assert_eq!(totals.total, Money::from_major(1230.0, Currency::INR));
//! # Ok::<(), cart_ledger::LedgerError>(())
//! ```
//!
//! Coupon validation is asynchronous; implement [`CouponValidator`]
//! over your HTTP client and call
//! [`CartLedger::apply_coupon`](cart::CartLedger::apply_coupon), or
//! drive the `stage_coupon`/`commit_coupon` pair yourself.
//!
//! [`CouponValidator`]: cart::CouponValidator

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod order;
pub mod persist;

pub use error::LedgerError;
pub use ids::ProductRef;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::LedgerError;
    pub use crate::ids::ProductRef;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{
        AppliedCoupon, CartLedger, CartSnapshot, CartTotals, CouponFailure, CouponKind,
        CouponOffer, CouponRequest, CouponState, CouponValidator, LineItem,
    };

    // Order
    pub use crate::order::{OrderDraft, OrderDraftLine};

    // Persist
    pub use crate::persist::PersistedCart;
}
