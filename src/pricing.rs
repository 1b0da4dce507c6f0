//! Price composition
//!
//! Combines a booking's pre-discount total with membership and promotion
//! discounts into a final payable amount. The pre-discount total is
//! recovered additively from the persisted figures (`total + discount`), so
//! repeated recompositions never drift. All arithmetic is in integer minor
//! units; percentage math rounds half away from zero.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use smallvec::SmallVec;

use crate::{
    adjustments::Adjustment, membership::MembershipDiscount, promotions::PromotionDiscount,
};

/// The persisted monetary figures of a booking, before recomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingTotals {
    /// Current final payable total, in minor units.
    pub total: u64,

    /// Current cumulative discount, in minor units.
    pub discount: u64,
}

impl BookingTotals {
    /// The booking total before any discounts, recovered additively.
    #[must_use]
    pub fn before_discounts(&self) -> u64 {
        self.total.saturating_add(self.discount)
    }
}

/// The result of recomposing a booking's price.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Membership discount applied, in minor units.
    pub membership_discount: u64,

    /// Promotion discount applied after clamping, in minor units.
    pub promotion_discount: u64,

    /// Sum of all discounts, in minor units.
    pub total_discount: u64,

    /// New final payable total, in minor units.
    pub total: u64,

    /// Rebuilt adjustment list: at most one membership entry followed by at
    /// most one promotion entry.
    pub adjustments: SmallVec<[Adjustment; 2]>,
}

/// Recompose a booking's price from its current totals and the new
/// discounts.
///
/// The promotion discount is clamped to whatever remains of the pre-discount
/// total after the membership discount; the final total never goes below
/// zero. The adjustment list is rebuilt from scratch.
#[must_use]
pub fn compose(
    totals: BookingTotals,
    membership: Option<&MembershipDiscount>,
    promotion: Option<&PromotionDiscount>,
) -> Composition {
    let total_before = totals.before_discounts();

    let membership_discount = membership
        .map(|m| m.amount.min(total_before))
        .unwrap_or_default();

    let promotion_discount = promotion
        .map(|p| clamp_promotion_discount(total_before, membership_discount, p.amount))
        .unwrap_or_default();

    let total_discount = membership_discount.saturating_add(promotion_discount);
    let total = total_before.saturating_sub(total_discount);

    let mut adjustments = SmallVec::new();

    if let Some(m) = membership {
        if membership_discount > 0 {
            adjustments.push(Adjustment::Membership {
                label: m.label.clone(),
                rate: m.rate,
                amount: membership_discount,
                includes_services: m.includes_services,
            });
        }
    }

    if let Some(p) = promotion {
        if promotion_discount > 0 {
            adjustments.push(Adjustment::Promotion {
                code: p.code.clone(),
                name: p.name.clone(),
                amount: promotion_discount,
                kind: p.kind,
                rate: p.rate,
                stacks_with_membership: p.stacks_with_membership,
                stacks_with_promotions: p.stacks_with_promotions,
            });
        }
    }

    Composition {
        membership_discount,
        promotion_discount,
        total_discount,
        total,
        adjustments,
    }
}

/// Clamp a raw promotion discount to the subtotal left after the membership
/// discount.
#[must_use]
pub fn clamp_promotion_discount(total_before: u64, membership_discount: u64, raw: u64) -> u64 {
    raw.min(total_before.saturating_sub(membership_discount))
}

/// `round(minor × rate / 100)`, half away from zero, in minor units.
///
/// Saturates to zero if the product cannot be represented, which can only
/// under-discount, never over-discount.
#[must_use]
pub fn percent_of_minor(minor: u64, rate: Decimal) -> u64 {
    Decimal::from(minor)
        .checked_mul(rate)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_u64())
        .unwrap_or(0)
}
