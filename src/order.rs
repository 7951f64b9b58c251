//! Order draft payload for the external order-submission component.
//!
//! The ledger does not persist orders; it packages its snapshot into
//! the shape the order-creation contract consumes.

use crate::cart::CartSnapshot;
use crate::ids::ProductRef;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Snapshot-derived payload handed to order submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Items being ordered.
    #[serde(rename = "lineItems")]
    pub line_items: Vec<OrderDraftLine>,
    /// Subtotal before discounts.
    pub subtotal: Money,
    /// Tax amount.
    pub taxes: Money,
    /// Shipping cost.
    pub shipping: Money,
    /// Grand total to charge.
    #[serde(rename = "totalPrice")]
    pub total_price: Money,
    /// Order currency.
    pub currency: Currency,
    /// Coupon code applied, if any.
    #[serde(rename = "couponCode", skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// One ordered line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraftLine {
    /// The priced item.
    pub product: ProductRef,
    /// Quantity ordered.
    pub quantity: i64,
    /// Unit price charged (the cart's snapshotted price).
    #[serde(rename = "unitPrice")]
    pub unit_price: Money,
    /// Row total.
    #[serde(rename = "lineTotal")]
    pub line_total: Money,
}

impl OrderDraft {
    /// Package a cart snapshot for submission.
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        let line_items = snapshot
            .items
            .iter()
            .map(|item| OrderDraftLine {
                product: item.product.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total(),
            })
            .collect();
        Self {
            line_items,
            subtotal: snapshot.totals.subtotal,
            taxes: snapshot.totals.tax,
            shipping: snapshot.totals.shipping,
            total_price: snapshot.totals.total,
            currency: snapshot.currency,
            coupon_code: snapshot.coupon_code.clone(),
        }
    }

    /// Total item count.
    pub fn item_count(&self) -> i64 {
        self.line_items.iter().map(|l| l.quantity).sum()
    }
}
