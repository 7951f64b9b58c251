//! The cart ledger: line items and their derived totals.

use crate::cart::coupon::{
    AppliedCoupon, CouponFailure, CouponKind, CouponOffer, CouponState, CouponValidator,
};
use crate::cart::pricing::CartTotals;
use crate::error::LedgerError;
use crate::ids::ProductRef;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// One product reference with quantity and snapshotted unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// The priced item.
    pub product: ProductRef,
    /// Quantity, always >= 1 while the row exists.
    pub quantity: i64,
    /// Unit price snapshotted when the row was first added. Never
    /// refreshed afterwards, so catalog price changes do not silently
    /// alter an existing cart.
    pub unit_price: Money,
}

impl LineItem {
    /// Row total, `unit_price * quantity`.
    ///
    /// Rows are admitted with checked arithmetic, so the saturating
    /// multiply never actually saturates.
    pub fn line_total(&self) -> Money {
        self.unit_price.saturating_mul(self.quantity)
    }
}

/// Immutable derived view of the cart, handed to rendering and
/// checkout. Replaced whole after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Line items in insertion order.
    pub items: Vec<LineItem>,
    /// Sum of all quantities.
    pub total_item_count: i64,
    /// The five derived monetary fields.
    pub totals: CartTotals,
    /// Applied coupon code, if any.
    pub coupon_code: Option<String>,
    /// Applied coupon kind, if any.
    pub coupon_kind: Option<CouponKind>,
    /// Cart currency.
    pub currency: Currency,
}

/// Handle for an in-flight coupon validation request.
///
/// Produced by [`CartLedger::stage_coupon`] and redeemed by
/// [`CartLedger::commit_coupon`]. The token is compared against the
/// ledger's epoch at commit time so only the most recently staged
/// request can land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRequest {
    code: String,
    token: u64,
}

impl CouponRequest {
    /// The code under validation.
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// The cart ledger.
///
/// Owns the line items and guarantees that the five derived monetary
/// fields are always mutually consistent with the item list and the
/// applied coupon. Every mutation either commits a fully recomputed
/// set of totals or leaves the previous state untouched.
#[derive(Debug, Clone)]
pub struct CartLedger {
    currency: Currency,
    items: Vec<LineItem>,
    coupon: CouponState,
    shipping: Money,
    totals: CartTotals,
    visible: bool,
    coupon_epoch: u64,
}

impl CartLedger {
    /// Create an empty ledger in the given currency.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            items: Vec::new(),
            coupon: CouponState::NotApplied,
            shipping: Money::zero(currency),
            totals: CartTotals::zero(currency),
            visible: false,
            coupon_epoch: 0,
        }
    }

    /// Add an item, snapshotting its unit price.
    ///
    /// If a row for the same product already exists, the quantity is
    /// summed into that row; the originally snapshotted unit price is
    /// kept even if a different `unit_price` is passed. This is
    /// deliberate: a re-add must not let a mid-session catalog change
    /// (or a tampered request) reprice what is already in the cart.
    ///
    /// Also marks the cart panel open.
    ///
    /// Returns an error if the quantity is not positive, a row would
    /// exceed [`MAX_QUANTITY_PER_ITEM`], or arithmetic would overflow.
    pub fn add_item(
        &mut self,
        product: ProductRef,
        unit_price: Money,
        quantity: i64,
    ) -> Result<(), LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        self.check_currency(&unit_price)?;

        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|i| i.product == product) {
            let new_quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or(LedgerError::Overflow)?;
            if new_quantity > MAX_QUANTITY_PER_ITEM {
                return Err(LedgerError::QuantityExceedsLimit(
                    new_quantity,
                    MAX_QUANTITY_PER_ITEM,
                ));
            }
            existing.quantity = new_quantity;
        } else {
            if quantity > MAX_QUANTITY_PER_ITEM {
                return Err(LedgerError::QuantityExceedsLimit(
                    quantity,
                    MAX_QUANTITY_PER_ITEM,
                ));
            }
            items.push(LineItem {
                product: product.clone(),
                quantity,
                unit_price,
            });
        }

        self.commit_items(items)?;
        self.visible = true;
        debug!(product = %product, quantity, "item added to cart");
        Ok(())
    }

    /// Remove a line item entirely, regardless of quantity.
    ///
    /// Idempotent: removing an absent product is a no-op and returns
    /// `false`.
    pub fn remove_item(&mut self, product: &ProductRef) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.product != product);
        let removed = self.items.len() < len_before;
        if removed {
            self.recompute();
            debug!(product = %product, "item removed from cart");
        }
        removed
    }

    /// Replace the quantity of an existing row.
    ///
    /// A quantity of zero or below removes the row. An absent product
    /// is a silent no-op and returns `Ok(false)`.
    pub fn update_quantity(
        &mut self,
        product: &ProductRef,
        quantity: i64,
    ) -> Result<bool, LedgerError> {
        if quantity <= 0 {
            return Ok(self.remove_item(product));
        }
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(LedgerError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        let Some(index) = self.items.iter().position(|i| &i.product == product) else {
            return Ok(false);
        };
        let mut items = self.items.clone();
        items[index].quantity = quantity;
        self.commit_items(items)?;
        Ok(true)
    }

    /// Stage a coupon validation request.
    ///
    /// Bumps the sequencing epoch so any earlier in-flight request
    /// becomes stale. While a coupon is already applied it keeps
    /// discounting the cart until the new result lands; otherwise the
    /// state moves to [`CouponState::Applying`].
    pub fn stage_coupon(&mut self, code: impl Into<String>) -> CouponRequest {
        let code = code.into();
        self.coupon_epoch += 1;
        let token = self.coupon_epoch;
        if !self.coupon.is_applied() {
            self.coupon = CouponState::Applying {
                code: code.clone(),
                token,
            };
        }
        CouponRequest { code, token }
    }

    /// Commit the outcome of a staged coupon request.
    ///
    /// If a newer request was staged since, the outcome is discarded
    /// without touching the cart and `CouponSuperseded` is returned.
    /// A rejection or transport failure never changes the monetary
    /// state: an already applied coupon stays applied, and the
    /// user-facing message is surfaced in the error.
    pub fn commit_coupon(
        &mut self,
        request: &CouponRequest,
        outcome: Result<CouponOffer, CouponFailure>,
    ) -> Result<AppliedCoupon, LedgerError> {
        if request.token != self.coupon_epoch {
            warn!(code = %request.code, "discarding stale coupon result");
            return Err(LedgerError::CouponSuperseded);
        }

        match outcome {
            Ok(offer) => {
                let discount = offer.discount_for(self.totals.subtotal);
                let applied = AppliedCoupon {
                    code: offer.code,
                    kind: offer.kind,
                    discount,
                };
                if applied.is_free_shipping() {
                    self.shipping = Money::zero(self.currency);
                }
                debug!(
                    code = %applied.code,
                    kind = applied.kind.as_str(),
                    discount = applied.discount.amount_minor,
                    "coupon applied"
                );
                self.coupon = CouponState::Applied(applied.clone());
                self.recompute();
                Ok(applied)
            }
            Err(CouponFailure::Rejected(message)) => {
                if !self.coupon.is_applied() {
                    self.coupon = CouponState::Rejected {
                        message: message.clone(),
                    };
                }
                Err(LedgerError::CouponRejected(message))
            }
            Err(CouponFailure::Transport(message)) => {
                if !self.coupon.is_applied() {
                    self.coupon = CouponState::NotApplied;
                }
                Err(LedgerError::CouponUnreachable(message))
            }
        }
    }

    /// Validate and apply a coupon code via the external collaborator.
    ///
    /// Convenience over [`stage_coupon`](Self::stage_coupon) and
    /// [`commit_coupon`](Self::commit_coupon); single attempt, the
    /// caller decides whether to retry.
    pub async fn apply_coupon(
        &mut self,
        code: &str,
        validator: &dyn CouponValidator,
    ) -> Result<AppliedCoupon, LedgerError> {
        let request = self.stage_coupon(code);
        let outcome = validator.validate(request.code()).await;
        self.commit_coupon(&request, outcome)
    }

    /// Restore a previously applied coupon without re-validating it.
    ///
    /// Used when loading a persisted cart: the discount amount was
    /// fixed when the coupon was first applied, so no round trip to
    /// the validation service is needed.
    pub fn restore_coupon(&mut self, coupon: AppliedCoupon) {
        if coupon.is_free_shipping() {
            self.shipping = Money::zero(self.currency);
        }
        self.coupon = CouponState::Applied(coupon);
        self.recompute();
    }

    /// Clear the applied coupon and its discount.
    ///
    /// Shipping is NOT restored after a free-shipping coupon; it stays
    /// zero until the next [`update_shipping`](Self::update_shipping)
    /// call delivers a fresh quote.
    pub fn remove_coupon(&mut self) {
        self.coupon = CouponState::NotApplied;
        self.recompute();
    }

    /// Set the delivery quote.
    ///
    /// Ignored in favor of zero while a free-shipping coupon is
    /// applied. Negative quotes are rejected.
    pub fn update_shipping(&mut self, quote: Money) -> Result<(), LedgerError> {
        self.check_currency(&quote)?;
        if quote.is_negative() {
            return Err(LedgerError::NegativeShipping(quote.amount_minor));
        }
        if self.coupon.free_shipping_active() {
            debug!(quote = quote.amount_minor, "free-shipping coupon in force, quote zeroed");
            self.shipping = Money::zero(self.currency);
        } else {
            self.shipping = quote;
        }
        self.recompute();
        Ok(())
    }

    /// Reset items, coupon state, shipping and all derived fields.
    ///
    /// The open/closed panel flag is untouched: clearing does not
    /// close the cart panel.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = CouponState::NotApplied;
        self.shipping = Money::zero(self.currency);
        // Invalidate any in-flight coupon request.
        self.coupon_epoch += 1;
        self.totals = CartTotals::zero(self.currency);
        debug!("cart cleared");
    }

    /// Flip the open/closed panel flag. No monetary effect.
    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    /// Whether the cart panel is open.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Loading a persisted cart must not pop the panel open.
    pub(crate) fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Get a row by product reference.
    pub fn get_item(&self, product: &ProductRef) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.product == product)
    }

    /// Total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Number of distinct rows.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current derived totals.
    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    /// Current coupon state.
    pub fn coupon(&self) -> &CouponState {
        &self.coupon
    }

    /// Cart currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Produce the immutable derived view of the cart.
    pub fn snapshot(&self) -> CartSnapshot {
        let applied = self.coupon.applied();
        CartSnapshot {
            items: self.items.clone(),
            total_item_count: self.item_count(),
            totals: self.totals,
            coupon_code: applied.map(|c| c.code.clone()),
            coupon_kind: applied.map(|c| c.kind),
            currency: self.currency,
        }
    }

    fn check_currency(&self, amount: &Money) -> Result<(), LedgerError> {
        if amount.currency != self.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: amount.currency.code().to_string(),
            });
        }
        Ok(())
    }

    /// Validate a candidate item list with checked arithmetic, then
    /// commit it and rederive the totals. A failed validation leaves
    /// the previous state untouched.
    fn commit_items(&mut self, items: Vec<LineItem>) -> Result<(), LedgerError> {
        let mut subtotal = Money::zero(self.currency);
        for item in &items {
            let line = item
                .unit_price
                .checked_mul(item.quantity)
                .ok_or(LedgerError::Overflow)?;
            subtotal = subtotal.checked_add(&line).ok_or(LedgerError::Overflow)?;
        }
        self.items = items;
        self.totals = CartTotals::derive(
            subtotal,
            self.coupon.discount(self.currency),
            self.shipping,
        );
        Ok(())
    }

    /// Rederive all totals from the current inputs. Used by the
    /// infallible mutations; rows were validated when they entered the
    /// cart, so this path cannot overflow.
    fn recompute(&mut self) {
        let mut subtotal = Money::zero(self.currency);
        for item in &self.items {
            subtotal = subtotal.saturating_add(&item.line_total());
        }
        self.totals = CartTotals::derive(
            subtotal,
            self.coupon.discount(self.currency),
            self.shipping,
        );
    }
}

impl Default for CartLedger {
    fn default() -> Self {
        Self::new(Currency::INR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inr(minor: i64) -> Money {
        Money::new(minor, Currency::INR)
    }

    fn assert_consistent(ledger: &CartLedger) {
        let t = ledger.totals();
        let expected = (t.subtotal.amount_minor - t.discount.amount_minor
            + t.tax.amount_minor
            + t.shipping.amount_minor)
            .max(0);
        assert_eq!(t.total.amount_minor, expected);
        assert_eq!(
            t.tax.amount_minor,
            t.subtotal.percentage(crate::cart::GST_RATE_PERCENT).amount_minor
        );
    }

    fn percentage_offer(value: f64) -> CouponOffer {
        CouponOffer {
            code: "SAVE".to_string(),
            kind: CouponKind::Percentage,
            value,
            min_amount: None,
            max_discount: None,
        }
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = CartLedger::default();
        assert!(ledger.is_empty());
        assert!(ledger.totals().total.is_zero());
        assert!(!ledger.is_visible());
    }

    #[test]
    fn test_add_item_derives_totals() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();

        // ₹1000 subtotal, ₹180 GST, ₹1180 total
        assert_eq!(ledger.totals().subtotal.amount_minor, 100000);
        assert_eq!(ledger.totals().tax.amount_minor, 18000);
        assert_eq!(ledger.totals().total.amount_minor, 118000);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_add_item_opens_cart() {
        let mut ledger = CartLedger::default();
        assert!(!ledger.is_visible());
        ledger
            .add_item(ProductRef::new("p1"), inr(100), 1)
            .unwrap();
        assert!(ledger.is_visible());
    }

    #[test]
    fn test_add_same_item_sums_quantity() {
        let mut ledger = CartLedger::default();
        let p = ProductRef::new("p1");
        ledger.add_item(p.clone(), inr(100000), 1).unwrap();
        ledger.add_item(p.clone(), inr(100000), 2).unwrap();

        assert_eq!(ledger.unique_item_count(), 1);
        assert_eq!(ledger.item_count(), 3);
        assert_eq!(ledger.totals().subtotal.amount_minor, 300000);
        assert_eq!(ledger.totals().tax.amount_minor, 54000);
        assert_eq!(ledger.totals().total.amount_minor, 354000);
    }

    #[test]
    fn test_re_add_keeps_snapshotted_price() {
        let mut ledger = CartLedger::default();
        let p = ProductRef::new("p1");
        ledger.add_item(p.clone(), inr(100000), 1).unwrap();
        // A different price on the re-add is ignored
        ledger.add_item(p.clone(), inr(50), 1).unwrap();

        let item = ledger.get_item(&p).unwrap();
        assert_eq!(item.unit_price.amount_minor, 100000);
        assert_eq!(ledger.totals().subtotal.amount_minor, 200000);
    }

    #[test]
    fn test_add_item_rejects_non_positive_quantity() {
        let mut ledger = CartLedger::default();
        let err = ledger
            .add_item(ProductRef::new("p1"), inr(100), 0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity(0)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_item_quantity_cap() {
        let mut ledger = CartLedger::default();
        let err = ledger
            .add_item(ProductRef::new("p1"), inr(100), MAX_QUANTITY_PER_ITEM + 1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::QuantityExceedsLimit(_, _)));
    }

    #[test]
    fn test_add_item_currency_mismatch() {
        let mut ledger = CartLedger::default();
        let err = ledger
            .add_item(ProductRef::new("p1"), Money::new(100, Currency::USD), 1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::CurrencyMismatch { .. }));
    }

    #[test]
    fn test_failed_add_leaves_state_untouched() {
        let mut ledger = CartLedger::default();
        let p = ProductRef::new("p1");
        ledger.add_item(p.clone(), inr(100000), 1).unwrap();
        let before = ledger.snapshot();

        let err = ledger.add_item(p.clone(), inr(100000), MAX_QUANTITY_PER_ITEM);
        assert!(err.is_err());
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_remove_item_is_idempotent() {
        let mut ledger = CartLedger::default();
        let p = ProductRef::new("p1");
        ledger.add_item(p.clone(), inr(100), 1).unwrap();

        assert!(ledger.remove_item(&p));
        let after_first = ledger.snapshot();
        assert!(!ledger.remove_item(&p));
        assert_eq!(ledger.snapshot(), after_first);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_update_quantity_replaces() {
        let mut ledger = CartLedger::default();
        let p = ProductRef::new("p1");
        ledger.add_item(p.clone(), inr(100000), 1).unwrap();

        assert!(ledger.update_quantity(&p, 5).unwrap());
        assert_eq!(ledger.item_count(), 5);
        assert_eq!(ledger.totals().subtotal.amount_minor, 500000);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_update_quantity_zero_or_negative_removes() {
        for quantity in [0, -5] {
            let mut ledger = CartLedger::default();
            let p = ProductRef::new("p1");
            ledger.add_item(p.clone(), inr(100), 2).unwrap();

            assert!(ledger.update_quantity(&p, quantity).unwrap());
            assert!(ledger.get_item(&p).is_none());
            assert!(ledger.totals().subtotal.is_zero());
        }
    }

    #[test]
    fn test_update_quantity_missing_is_noop() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100), 1)
            .unwrap();
        let before = ledger.snapshot();

        assert!(!ledger.update_quantity(&ProductRef::new("absent"), 3).unwrap());
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_commit_percentage_coupon() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();
        ledger.update_shipping(inr(5000)).unwrap();

        let request = ledger.stage_coupon("SAVE10");
        let applied = ledger
            .commit_coupon(&request, Ok(percentage_offer(10.0)))
            .unwrap();

        assert_eq!(applied.discount.amount_minor, 10000);
        assert_eq!(ledger.totals().discount.amount_minor, 10000);
        // 1000 - 100 + 180 + 50
        assert_eq!(ledger.totals().total.amount_minor, 113000);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_commit_fixed_coupon() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();

        let request = ledger.stage_coupon("FLAT50");
        let offer = CouponOffer {
            code: "FLAT50".to_string(),
            kind: CouponKind::Fixed,
            value: 50.0,
            min_amount: None,
            max_discount: None,
        };
        ledger.commit_coupon(&request, Ok(offer)).unwrap();

        assert_eq!(ledger.totals().discount.amount_minor, 5000);
        // 1000 - 50 + 180 + 0
        assert_eq!(ledger.totals().total.amount_minor, 113000);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_commit_free_shipping_coupon_zeroes_shipping() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();
        ledger.update_shipping(inr(5000)).unwrap();

        let request = ledger.stage_coupon("SHIPFREE");
        let offer = CouponOffer {
            code: "SHIPFREE".to_string(),
            kind: CouponKind::FreeShipping,
            value: 0.0,
            min_amount: None,
            max_discount: None,
        };
        ledger.commit_coupon(&request, Ok(offer)).unwrap();

        assert!(ledger.totals().shipping.is_zero());
        assert!(ledger.totals().discount.is_zero());
        assert_eq!(ledger.totals().total.amount_minor, 118000);

        // A later quote is ignored while the coupon holds
        ledger.update_shipping(inr(7000)).unwrap();
        assert!(ledger.totals().shipping.is_zero());
    }

    #[test]
    fn test_rejected_coupon_leaves_cart_unchanged() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();
        let totals_before = *ledger.totals();

        let request = ledger.stage_coupon("BOGUS");
        let err = ledger
            .commit_coupon(
                &request,
                Err(CouponFailure::Rejected("Invalid coupon".to_string())),
            )
            .unwrap_err();

        assert!(matches!(err, LedgerError::CouponRejected(ref m) if m == "Invalid coupon"));
        assert_eq!(*ledger.totals(), totals_before);
        assert!(matches!(
            ledger.coupon(),
            CouponState::Rejected { message } if message == "Invalid coupon"
        ));
        assert!(ledger.snapshot().coupon_code.is_none());
    }

    #[test]
    fn test_rejection_keeps_previously_applied_coupon() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();

        let request = ledger.stage_coupon("SAVE10");
        ledger
            .commit_coupon(&request, Ok(percentage_offer(10.0)))
            .unwrap();

        let request = ledger.stage_coupon("BOGUS");
        let _ = ledger.commit_coupon(
            &request,
            Err(CouponFailure::Rejected("Invalid coupon".to_string())),
        );

        assert!(ledger.coupon().is_applied());
        assert_eq!(ledger.totals().discount.amount_minor, 10000);
    }

    #[test]
    fn test_stale_coupon_commit_is_discarded() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();

        let first = ledger.stage_coupon("SAVE10");
        let second = ledger.stage_coupon("SAVE20");

        // The older request resolves last in wall-clock order but must
        // not land: its token is stale.
        let err = ledger
            .commit_coupon(&first, Ok(percentage_offer(10.0)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::CouponSuperseded));
        assert!(ledger.totals().discount.is_zero());

        ledger
            .commit_coupon(&second, Ok(percentage_offer(20.0)))
            .unwrap();
        assert_eq!(ledger.totals().discount.amount_minor, 20000);
    }

    #[test]
    fn test_transport_failure_resets_pending_state() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();

        let request = ledger.stage_coupon("SAVE10");
        let err = ledger
            .commit_coupon(
                &request,
                Err(CouponFailure::Transport("connection refused".to_string())),
            )
            .unwrap_err();

        assert!(matches!(err, LedgerError::CouponUnreachable(_)));
        assert_eq!(*ledger.coupon(), CouponState::NotApplied);
        assert!(ledger.totals().discount.is_zero());
    }

    #[test]
    fn test_remove_coupon_keeps_zeroed_shipping() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();
        ledger.update_shipping(inr(5000)).unwrap();

        let request = ledger.stage_coupon("SHIPFREE");
        let offer = CouponOffer {
            code: "SHIPFREE".to_string(),
            kind: CouponKind::FreeShipping,
            value: 0.0,
            min_amount: None,
            max_discount: None,
        };
        ledger.commit_coupon(&request, Ok(offer)).unwrap();

        ledger.remove_coupon();
        // Shipping stays zero until the next explicit quote
        assert!(ledger.totals().shipping.is_zero());
        assert_eq!(*ledger.coupon(), CouponState::NotApplied);

        ledger.update_shipping(inr(5000)).unwrap();
        assert_eq!(ledger.totals().shipping.amount_minor, 5000);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_update_shipping_rejects_negative() {
        let mut ledger = CartLedger::default();
        let err = ledger.update_shipping(inr(-100)).unwrap_err();
        assert!(matches!(err, LedgerError::NegativeShipping(-100)));
    }

    #[test]
    fn test_clear_resets_everything_but_visibility() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 2)
            .unwrap();
        ledger.update_shipping(inr(5000)).unwrap();
        let request = ledger.stage_coupon("SAVE10");
        ledger
            .commit_coupon(&request, Ok(percentage_offer(10.0)))
            .unwrap();
        assert!(ledger.is_visible());

        ledger.clear();

        assert!(ledger.is_empty());
        let t = ledger.totals();
        assert!(t.subtotal.is_zero());
        assert!(t.discount.is_zero());
        assert!(t.tax.is_zero());
        assert!(t.shipping.is_zero());
        assert!(t.total.is_zero());
        assert_eq!(*ledger.coupon(), CouponState::NotApplied);
        // Clearing does not close the panel
        assert!(ledger.is_visible());
    }

    #[test]
    fn test_clear_invalidates_in_flight_coupon() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();
        let request = ledger.stage_coupon("SAVE10");

        ledger.clear();

        let err = ledger
            .commit_coupon(&request, Ok(percentage_offer(10.0)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::CouponSuperseded));
        assert!(ledger.totals().discount.is_zero());
    }

    #[test]
    fn test_toggle_visibility() {
        let mut ledger = CartLedger::default();
        ledger.toggle_visibility();
        assert!(ledger.is_visible());
        ledger.toggle_visibility();
        assert!(!ledger.is_visible());
    }

    #[test]
    fn test_snapshot_reflects_coupon() {
        let mut ledger = CartLedger::default();
        ledger
            .add_item(ProductRef::new("p1"), inr(100000), 1)
            .unwrap();
        let request = ledger.stage_coupon("SAVE10");
        ledger
            .commit_coupon(&request, Ok(percentage_offer(10.0)))
            .unwrap();

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.total_item_count, 1);
        assert_eq!(snapshot.coupon_code.as_deref(), Some("SAVE"));
        assert_eq!(snapshot.coupon_kind, Some(CouponKind::Percentage));
        assert_eq!(snapshot.totals, *ledger.totals());
    }

    #[test]
    fn test_consistency_across_mutation_orders() {
        let mut ledger = CartLedger::default();
        let a = ProductRef::new("a");
        let b = ProductRef::new("b");

        ledger.add_item(a.clone(), inr(25000), 2).unwrap();
        assert_consistent(&ledger);
        ledger.update_shipping(inr(4000)).unwrap();
        assert_consistent(&ledger);
        ledger.add_item(b.clone(), inr(9900), 3).unwrap();
        assert_consistent(&ledger);
        let request = ledger.stage_coupon("SAVE10");
        ledger
            .commit_coupon(&request, Ok(percentage_offer(10.0)))
            .unwrap();
        assert_consistent(&ledger);
        ledger.update_quantity(&a, 1).unwrap();
        assert_consistent(&ledger);
        ledger.remove_item(&b);
        assert_consistent(&ledger);
        ledger.remove_coupon();
        assert_consistent(&ledger);
    }
}
