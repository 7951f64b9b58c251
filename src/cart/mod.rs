//! The cart ledger module.
//!
//! Contains the ledger itself, coupon types with the external
//! validation seam, and the derived totals.

mod coupon;
mod ledger;
mod pricing;

pub use coupon::{
    AppliedCoupon, CouponFailure, CouponKind, CouponOffer, CouponState, CouponValidator,
};
pub use ledger::{CartLedger, CartSnapshot, CouponRequest, LineItem, MAX_QUANTITY_PER_ITEM};
pub use pricing::{CartTotals, GST_RATE_PERCENT};
