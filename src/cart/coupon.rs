//! Coupon types and the external validation seam.
//!
//! The ledger never decides whether a code is valid; a remote
//! validation service does. [`CouponOffer`] mirrors that service's
//! success payload, and [`CouponValidator`] is the seam the storefront
//! implements over its HTTP client. Eligibility rules such as a
//! minimum cart amount are enforced server-side only; re-checking them
//! here would risk diverging from server policy.

use crate::money::{Currency, Money};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The discount mechanism of a validated coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// Percentage off the subtotal.
    Percentage,
    /// Fixed amount off.
    Fixed,
    /// Shipping zeroed, no subtotal discount.
    FreeShipping,
}

impl CouponKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponKind::Percentage => "percentage",
            CouponKind::Fixed => "fixed",
            CouponKind::FreeShipping => "free_shipping",
        }
    }
}

/// Successful validation payload from the coupon service.
///
/// `value` is a percentage for [`CouponKind::Percentage`], a
/// major-unit amount for [`CouponKind::Fixed`], and unused for
/// [`CouponKind::FreeShipping`]. `min_amount` is informational: the
/// service has already checked it before returning an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponOffer {
    /// The coupon code, as canonicalized by the service.
    pub code: String,
    /// Discount mechanism.
    #[serde(rename = "type")]
    pub kind: CouponKind,
    /// Percentage or major-unit amount, depending on `kind`.
    pub value: f64,
    /// Minimum cart amount the service required, major units.
    #[serde(rename = "minAmount", skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    /// Cap on the discount, major units.
    #[serde(rename = "maxDiscount", skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<f64>,
}

impl CouponOffer {
    /// Calculate the discount this offer grants on a subtotal.
    ///
    /// Percentage discounts are rounded to the nearest minor unit and
    /// capped at `max_discount`. Fixed discounts are capped at
    /// `max_discount` and never exceed the subtotal. Free shipping
    /// grants no subtotal discount.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let currency = subtotal.currency;
        match self.kind {
            CouponKind::Percentage => {
                let mut discount = subtotal.percentage(self.value);
                if let Some(cap) = self.max_discount {
                    let cap = Money::from_major(cap, currency);
                    if discount.amount_minor > cap.amount_minor {
                        discount = cap;
                    }
                }
                discount
            }
            CouponKind::Fixed => {
                let mut discount = Money::from_major(self.value, currency);
                if let Some(cap) = self.max_discount {
                    let cap = Money::from_major(cap, currency);
                    if discount.amount_minor > cap.amount_minor {
                        discount = cap;
                    }
                }
                // Don't exceed subtotal
                if discount.amount_minor > subtotal.amount_minor {
                    discount = subtotal;
                }
                discount
            }
            CouponKind::FreeShipping => Money::zero(currency),
        }
    }
}

/// Why a coupon could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponFailure {
    /// The service examined the code and rejected it; the message is
    /// user-facing.
    #[error("{0}")]
    Rejected(String),

    /// The service could not be reached.
    #[error("Coupon service unreachable: {0}")]
    Transport(String),
}

/// External coupon validation collaborator.
///
/// Single attempt per call; retry policy is the caller's concern.
#[async_trait]
pub trait CouponValidator: Send + Sync {
    /// Validate a code, returning the offer it grants.
    async fn validate(&self, code: &str) -> Result<CouponOffer, CouponFailure>;
}

/// A coupon that has been applied to the cart.
///
/// The discount amount is fixed at application time and is not
/// re-derived when the item list changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    /// The code that was applied.
    pub code: String,
    /// Discount mechanism, retained so later shipping-quote updates
    /// can re-derive zero shipping without re-validating.
    pub kind: CouponKind,
    /// Absolute discount taken off the subtotal.
    pub discount: Money,
}

impl AppliedCoupon {
    /// Check whether this coupon zeroes shipping.
    pub fn is_free_shipping(&self) -> bool {
        self.kind == CouponKind::FreeShipping
    }
}

/// Coupon application state of the cart.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CouponState {
    /// No coupon in play.
    #[default]
    NotApplied,
    /// A validation request is in flight.
    Applying {
        /// Code being validated.
        code: String,
        /// Sequencing token of the request.
        token: u64,
    },
    /// A coupon is applied and discounting the cart.
    Applied(AppliedCoupon),
    /// The last attempt was rejected; nothing is discounting the cart.
    Rejected {
        /// User-facing message from the validation service.
        message: String,
    },
}

impl CouponState {
    /// Check if a coupon is currently applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, CouponState::Applied(_))
    }

    /// Get the applied coupon, if any.
    pub fn applied(&self) -> Option<&AppliedCoupon> {
        match self {
            CouponState::Applied(coupon) => Some(coupon),
            _ => None,
        }
    }

    /// The discount currently in force.
    pub fn discount(&self, currency: Currency) -> Money {
        self.applied()
            .map(|c| c.discount)
            .unwrap_or_else(|| Money::zero(currency))
    }

    /// Check whether an applied free-shipping coupon is in force.
    pub fn free_shipping_active(&self) -> bool {
        self.applied().map(|c| c.is_free_shipping()).unwrap_or(false)
    }
}
