//! Derived cart totals.

use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// GST rate applied to the subtotal.
///
/// Tax is computed on the pre-discount subtotal. That is deliberate
/// (tax on list price) and must not be "fixed" to the discounted base.
pub const GST_RATE_PERCENT: f64 = 18.0;

/// The five derived monetary fields of the cart.
///
/// Always produced whole by [`CartTotals::derive`]; never patched
/// field by field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of unit price times quantity over all rows.
    pub subtotal: Money,
    /// Absolute amount removed by the applied coupon; zero if none.
    pub discount: Money,
    /// GST on the pre-discount subtotal, rounded to the nearest minor
    /// unit.
    pub tax: Money,
    /// Current delivery quote; zero under a free-shipping coupon.
    pub shipping: Money,
    /// `subtotal - discount + tax + shipping`, clamped at zero.
    pub total: Money,
}

impl CartTotals {
    /// All-zero totals in the given currency.
    pub fn zero(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            subtotal: zero,
            discount: zero,
            tax: zero,
            shipping: zero,
            total: zero,
        }
    }

    /// Derive the full set of totals from its three inputs.
    ///
    /// Inputs are bounded by checked arithmetic at mutation time, so
    /// the saturating operations here never actually saturate.
    pub fn derive(subtotal: Money, discount: Money, shipping: Money) -> Self {
        let currency = subtotal.currency;
        let tax = subtotal.percentage(GST_RATE_PERCENT);
        let total = subtotal
            .amount_minor
            .saturating_sub(discount.amount_minor)
            .saturating_add(tax.amount_minor)
            .saturating_add(shipping.amount_minor)
            .max(0);
        Self {
            subtotal,
            discount,
            tax,
            shipping,
            total: Money::new(total, currency),
        }
    }

    /// Check if any discount is in force.
    pub fn has_discount(&self) -> bool {
        self.discount.is_positive()
    }

    /// Amount saved by the applied coupon.
    pub fn savings(&self) -> Money {
        self.discount
    }
}
