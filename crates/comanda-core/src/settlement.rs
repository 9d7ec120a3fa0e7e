//! # Settlement Math
//!
//! Pure computation behind the payment settlement flow: the quote
//! (original total, discount, amount due) and the per-method tender rule.
//!
//! ## Where This Fits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Settlement Flow (two halves)                    │
//! │                                                                     │
//! │  comanda-db::settlement (I/O half)                                  │
//! │  ├── lock order row, read lines, resolve promo code                 │
//! │  ├── THIS MODULE: quote() + validate_tender()   ← pure half         │
//! │  └── persist SettlementTx / Invoice / Order atomically              │
//! │                                                                     │
//! │  The preview (dry-run) path reuses the same pure half with plain    │
//! │  reads and no lock, which is what makes it exactly consistent       │
//! │  with the committing path.                                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::promotion::Evaluation;
use crate::types::PaymentMethod;

// =============================================================================
// Quote
// =============================================================================

/// The priced outcome of a settlement computation, before any tender is
/// considered. Both the committing path and the preview path produce
/// exactly this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Order total before any discount.
    pub original_total: Money,
    /// Discount produced by the promotion evaluator (zero when none).
    pub discount: Money,
    /// `max(0, original_total - discount)`.
    pub amount_due: Money,
    /// The promotion behind the discount, when one resolved.
    pub promotion_id: Option<String>,
}

/// Builds a quote from the order's pre-discount total and a promotion
/// evaluation.
pub fn quote(original_total: Money, evaluation: Evaluation) -> Quote {
    let amount_due = original_total.saturating_sub_zero(evaluation.discount);
    Quote {
        original_total,
        discount: evaluation.discount,
        amount_due,
        promotion_id: evaluation.promotion_id,
    }
}

// =============================================================================
// Tender Validation
// =============================================================================

/// The amount a settlement attempt actually captures, per payment method.
///
/// - **Cash**: the customer hands over `tendered`; it must cover the
///   amount due. Overpayment is fine (change is the register's concern).
/// - **Card / Qr**: the terminal captures exactly the amount due, so the
///   recorded tender is the due amount regardless of what was passed in.
///
/// Returns the amount to record as tendered, or
/// [`CoreError::InsufficientPayment`] with the shortfall.
pub fn validate_tender(
    method: PaymentMethod,
    tendered: Money,
    due: Money,
) -> CoreResult<Money> {
    match method {
        PaymentMethod::Cash => {
            if tendered < due {
                Err(CoreError::InsufficientPayment {
                    short_by: due - tendered,
                })
            } else {
                Ok(tendered)
            }
        }
        // Exact-capture methods cannot be short
        PaymentMethod::Card | PaymentMethod::Qr => Ok(due),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_without_promotion_equals_original_total() {
        let q = quote(Money::from_cents(6_000), Evaluation::none());
        assert_eq!(q.amount_due, q.original_total);
        assert_eq!(q.discount, Money::zero());
        assert!(q.promotion_id.is_none());
    }

    #[test]
    fn quote_subtracts_discount() {
        // 100.00 with a 20.00 discount -> 80.00 due
        let q = quote(
            Money::from_cents(10_000),
            Evaluation {
                discount: Money::from_cents(2_000),
                promotion_id: Some("p1".into()),
            },
        );
        assert_eq!(q.amount_due.cents(), 8_000);
        assert_eq!(q.original_total.cents(), 10_000);
        assert_eq!(q.promotion_id.as_deref(), Some("p1"));
    }

    #[test]
    fn quote_never_goes_negative() {
        // Discount larger than the bill clamps the due amount at zero
        let q = quote(
            Money::from_cents(5_000),
            Evaluation {
                discount: Money::from_cents(5_000),
                promotion_id: Some("p1".into()),
            },
        );
        assert_eq!(q.amount_due, Money::zero());
    }

    #[test]
    fn cash_requires_covering_tender() {
        let due = Money::from_cents(6_000);

        let err = validate_tender(PaymentMethod::Cash, Money::from_cents(5_000), due)
            .unwrap_err();
        match err {
            CoreError::InsufficientPayment { short_by } => {
                assert_eq!(short_by.cents(), 1_000)
            }
            other => panic!("unexpected error: {other}"),
        }

        // Exact and over-tender both pass; the tendered amount is recorded
        assert_eq!(
            validate_tender(PaymentMethod::Cash, due, due).unwrap(),
            due
        );
        assert_eq!(
            validate_tender(PaymentMethod::Cash, Money::from_cents(7_000), due)
                .unwrap()
                .cents(),
            7_000
        );
    }

    #[test]
    fn card_and_qr_capture_exactly_due() {
        let due = Money::from_cents(4_500);

        // Whatever was passed in, the captured amount is the due amount
        assert_eq!(
            validate_tender(PaymentMethod::Card, Money::zero(), due).unwrap(),
            due
        );
        assert_eq!(
            validate_tender(PaymentMethod::Qr, Money::from_cents(9_999), due).unwrap(),
            due
        );
    }
}
