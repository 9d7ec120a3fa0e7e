//! # Promotion Evaluator
//!
//! Pure evaluation of a promotion against an order's line items.
//!
//! ## Contract
//! ```text
//! evaluate(promotion?, lines, now) -> Evaluation { discount, promotion_id? }
//! ```
//!
//! - No promotion, an inactive promotion, or one outside its validity
//!   window yields a zero discount and a `None` reference. This is the
//!   deliberate leniency of the checkout flow: an invalid code behaves as
//!   "no discount", never as a hard error. Callers can only distinguish
//!   "invalid code" from "valid but zero discount" by the absent reference.
//! - Item-scoped promotions discount only the matching lines' extended
//!   prices; unscoped promotions discount the whole order.
//! - The discount is never negative and never exceeds the eligible
//!   subtotal (flat discounts are clamped).
//!
//! ## Purity
//! No side effects whatsoever: the order is not mutated and no usage
//! counter exists. Anything persistent (recording the promotion on the
//! order/invoice) belongs to the settlement service on success.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{DiscountKind, OrderLine, Promotion};

/// Result of evaluating a promotion against an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Discount to subtract from the order total. Zero when no valid
    /// promotion applied.
    pub discount: Money,
    /// The promotion that produced the discount, when one resolved as
    /// valid. `None` means "no discount applies" — including the
    /// invalid-code case.
    pub promotion_id: Option<String>,
}

impl Evaluation {
    /// The no-discount evaluation.
    pub fn none() -> Self {
        Evaluation {
            discount: Money::zero(),
            promotion_id: None,
        }
    }
}

/// Sum of the extended prices the promotion may discount.
///
/// An empty eligibility set means the promotion covers every line.
/// Matching is by menu item identity, not by name.
pub fn eligible_subtotal(promotion: &Promotion, lines: &[OrderLine]) -> Money {
    if promotion.eligible_item_ids.is_empty() {
        return lines.iter().map(OrderLine::line_total).sum();
    }

    lines
        .iter()
        .filter(|l| promotion.eligible_item_ids.contains(&l.menu_item_id))
        .map(OrderLine::line_total)
        .sum()
}

/// Evaluates an optional promotion against an order's lines at `now`.
///
/// ## Example
/// ```rust
/// use comanda_core::promotion::{evaluate, Evaluation};
///
/// // No code supplied: zero discount, no reference.
/// assert_eq!(evaluate(None, &[], chrono::Utc::now()), Evaluation::none());
/// ```
pub fn evaluate(
    promotion: Option<&Promotion>,
    lines: &[OrderLine],
    now: DateTime<Utc>,
) -> Evaluation {
    let Some(promo) = promotion else {
        return Evaluation::none();
    };

    if !promo.is_valid_at(now) {
        return Evaluation::none();
    }

    let subtotal = eligible_subtotal(promo, lines);
    if !subtotal.is_positive() {
        // Valid promotion, but nothing on the order it can discount.
        return Evaluation {
            discount: Money::zero(),
            promotion_id: Some(promo.id.clone()),
        };
    }

    let discount = match promo.discount_kind {
        DiscountKind::Percent => {
            // discount_value is basis points; negative or oversized values
            // are rejected at creation time, clamp anyway.
            let bps = promo.discount_value.clamp(0, 10_000) as u32;
            subtotal.percentage_bps(bps)
        }
        DiscountKind::Flat => {
            let flat = Money::from_cents(promo.discount_value.max(0));
            flat.min(subtotal)
        }
    };

    Evaluation {
        discount,
        promotion_id: Some(promo.id.clone()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo(kind: DiscountKind, value: i64, eligible: Vec<&str>) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: "promo-1".into(),
            name: "Test Promo".into(),
            code: "SAVE".into(),
            discount_kind: kind,
            discount_value: value,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
            eligible_item_ids: eligible.into_iter().map(String::from).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn line(item_id: &str, unit_cents: i64, qty: i64) -> OrderLine {
        OrderLine {
            id: format!("line-{item_id}"),
            order_id: "order-1".into(),
            menu_item_id: item_id.into(),
            name_snapshot: item_id.into(),
            unit_price_cents: unit_cents,
            quantity: qty,
            line_total_cents: unit_cents * qty,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_promotion_means_no_discount() {
        let lines = vec![line("pho", 5_000, 2)];
        let eval = evaluate(None, &lines, Utc::now());
        assert_eq!(eval, Evaluation::none());
    }

    #[test]
    fn expired_promotion_is_silently_ignored() {
        let mut p = promo(DiscountKind::Percent, 1_000, vec![]);
        p.ends_at = Utc::now() - Duration::days(1);
        p.starts_at = Utc::now() - Duration::days(2);

        let lines = vec![line("pho", 5_000, 2)];
        let eval = evaluate(Some(&p), &lines, Utc::now());
        assert_eq!(eval.discount, Money::zero());
        assert!(eval.promotion_id.is_none());
    }

    #[test]
    fn inactive_promotion_is_silently_ignored() {
        let mut p = promo(DiscountKind::Flat, 500, vec![]);
        p.is_active = false;

        let eval = evaluate(Some(&p), &[line("a", 1_000, 1)], Utc::now());
        assert_eq!(eval, Evaluation::none());
    }

    #[test]
    fn percent_discount_over_full_order() {
        // 20% of 100.00 = 20.00
        let p = promo(DiscountKind::Percent, 2_000, vec![]);
        let lines = vec![line("steak", 6_000, 1), line("wine", 4_000, 1)];

        let eval = evaluate(Some(&p), &lines, Utc::now());
        assert_eq!(eval.discount.cents(), 2_000);
        assert_eq!(eval.promotion_id.as_deref(), Some("promo-1"));
    }

    #[test]
    fn flat_discount_clamped_to_subtotal() {
        // Flat 100.00 on a 50.00 bill clamps to 50.00
        let p = promo(DiscountKind::Flat, 10_000, vec![]);
        let lines = vec![line("soup", 5_000, 1)];

        let eval = evaluate(Some(&p), &lines, Utc::now());
        assert_eq!(eval.discount.cents(), 5_000);
    }

    #[test]
    fn item_scoped_discount_ignores_other_lines() {
        // 50% off "pho" only; the steak's price must not affect the result
        let p = promo(DiscountKind::Percent, 5_000, vec!["pho"]);
        let lines = vec![line("pho", 4_000, 2), line("steak", 50_000, 3)];

        let eval = evaluate(Some(&p), &lines, Utc::now());
        // 50% of (4000 * 2) = 4000
        assert_eq!(eval.discount.cents(), 4_000);
    }

    #[test]
    fn scoped_promotion_with_no_matching_lines_gives_zero_with_reference() {
        let p = promo(DiscountKind::Percent, 5_000, vec!["dessert"]);
        let lines = vec![line("pho", 4_000, 1)];

        let eval = evaluate(Some(&p), &lines, Utc::now());
        assert_eq!(eval.discount, Money::zero());
        // The promotion itself was valid, so the reference is kept
        assert!(eval.promotion_id.is_some());
    }

    #[test]
    fn discount_is_never_negative() {
        let p = promo(DiscountKind::Flat, -500, vec![]);
        let lines = vec![line("pho", 4_000, 1)];

        let eval = evaluate(Some(&p), &lines, Utc::now());
        assert_eq!(eval.discount, Money::zero());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let p = promo(DiscountKind::Percent, 1_000, vec![]);
        let lines = vec![line("pho", 5_000, 2)];
        let now = Utc::now();

        let first = evaluate(Some(&p), &lines, now);
        let second = evaluate(Some(&p), &lines, now);
        assert_eq!(first, second);
    }
}
