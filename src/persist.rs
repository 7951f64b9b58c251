//! Minimal persisted form of the cart.
//!
//! Only the inputs are persisted: line items, the applied coupon and
//! the shipping quote. Derived totals are recomputed on load so a
//! stale stored total can never drift from the items that produced
//! it. The storage medium itself is the caller's concern; this type
//! just fixes the shape under a stable key.

use crate::cart::{AppliedCoupon, CartLedger, LineItem};
use crate::error::LedgerError;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Stable serialized shape of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCart {
    /// Line items in insertion order.
    pub items: Vec<LineItem>,
    /// Applied coupon, if any. In-flight and rejected coupon states
    /// are transient and not persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<AppliedCoupon>,
    /// Current shipping quote (already zero under free shipping).
    pub shipping: Money,
    /// Cart currency.
    pub currency: Currency,
}

impl PersistedCart {
    /// Capture the persistable inputs of a ledger.
    pub fn from_ledger(ledger: &CartLedger) -> Self {
        Self {
            items: ledger.items().to_vec(),
            coupon: ledger.coupon().applied().cloned(),
            shipping: ledger.totals().shipping,
            currency: ledger.currency(),
        }
    }

    /// Rebuild a ledger, rederiving all totals from the persisted
    /// inputs.
    ///
    /// Returns an error if the stored rows fail the ledger's own
    /// admission checks (bad quantity, currency mismatch, overflow),
    /// which should only happen with a tampered or corrupted store.
    pub fn into_ledger(self) -> Result<CartLedger, LedgerError> {
        let mut ledger = CartLedger::new(self.currency);
        for item in self.items {
            ledger.add_item(item.product, item.unit_price, item.quantity)?;
        }
        if let Some(coupon) = self.coupon {
            ledger.restore_coupon(coupon);
        }
        ledger.update_shipping(self.shipping)?;
        ledger.set_visibility(false);
        Ok(ledger)
    }
}
