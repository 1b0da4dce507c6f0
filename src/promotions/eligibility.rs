//! Promotion eligibility
//!
//! The discount rule resolver: an ordered chain of checks that either rejects
//! a code with a specific reason or produces a rule-checked
//! [`PromotionDiscount`]. Existence of the code is resolved by the storage
//! layer before this runs; the global usage cap is re-checked against a fresh
//! counter read inside the redemption transaction, so the check here only
//! fails fast on an obviously exhausted code.

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    pricing::{clamp_promotion_discount, percent_of_minor},
    promotions::{BookingContext, Caller, Promotion, PromotionDiscount, SimpleDiscount},
};

/// Reasons a promotion code cannot be applied to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EligibilityError {
    /// The validity window has not opened yet.
    #[error("this code is not valid yet")]
    NotYetValid,

    /// The validity window has closed.
    #[error("this code has expired")]
    Expired,

    /// The global or per-user usage cap has been reached.
    #[error("this code has reached its usage limit")]
    UsageLimitReached,

    /// The code is restricted to registered users and the caller is anonymous.
    #[error("sign in to use this code")]
    LoginRequired,

    /// The booking or caller falls outside the promotion's scope.
    #[error("this code cannot be used on this booking")]
    NotEligible,

    /// The promotion does not stack with the membership discount already
    /// present on the booking.
    #[error("this code cannot be combined with your membership discount")]
    ConflictsWithMembership,

    /// A different code is already applied; it must be removed first.
    #[error("another code is already applied to this booking")]
    AnotherCodeApplied,

    /// The pre-discount total is below the promotion's minimum.
    #[error("the booking total is below the minimum required for this code")]
    BelowMinimum,

    /// The discount, after clamping, would not reduce the total.
    #[error("this code would not reduce the booking total")]
    NoEffectiveDiscount,
}

/// Run the ordered eligibility checks and compute the discount a promotion
/// grants on a booking.
///
/// Checks short-circuit in a fixed order so the caller always sees the most
/// specific failure: validity window, global cap, user scope, listing scope,
/// property-type scope, tier scope, membership stacking, already-applied
/// code, minimum value. Re-applying the code already on the booking is not an
/// error; the ledger treats it as a no-op.
///
/// # Errors
///
/// Returns the first failed check as an [`EligibilityError`].
pub fn resolve_discount(
    promotion: &Promotion,
    ctx: &BookingContext,
    now: Timestamp,
) -> Result<PromotionDiscount, EligibilityError> {
    check_validity_window(promotion, now)?;
    check_global_cap(promotion)?;
    check_user_scope(promotion, ctx)?;
    check_listing_scope(promotion, ctx)?;
    check_property_type_scope(promotion, ctx)?;
    check_tier_scope(promotion, ctx)?;
    check_membership_stacking(promotion, ctx)?;
    check_applied_code(promotion, ctx)?;
    check_minimum_value(promotion, ctx)?;

    let raw = raw_discount(promotion, ctx);

    let amount =
        clamp_promotion_discount(ctx.total_before_discounts, ctx.membership_discount, raw);

    if amount == 0 {
        return Err(EligibilityError::NoEffectiveDiscount);
    }

    Ok(PromotionDiscount {
        code: promotion.code.clone(),
        name: promotion.name.clone(),
        amount,
        kind: promotion.discount.kind(),
        rate: promotion.discount.rate(),
        stacks_with_membership: promotion.stacks_with_membership,
        stacks_with_promotions: promotion.stacks_with_promotions,
    })
}

fn check_validity_window(promotion: &Promotion, now: Timestamp) -> Result<(), EligibilityError> {
    if promotion.valid_from.is_some_and(|from| now < from) {
        return Err(EligibilityError::NotYetValid);
    }

    if promotion.valid_until.is_some_and(|until| now > until) {
        return Err(EligibilityError::Expired);
    }

    Ok(())
}

fn check_global_cap(promotion: &Promotion) -> Result<(), EligibilityError> {
    if promotion
        .max_uses
        .is_some_and(|max| promotion.use_count >= max)
    {
        return Err(EligibilityError::UsageLimitReached);
    }

    Ok(())
}

fn check_user_scope(promotion: &Promotion, ctx: &BookingContext) -> Result<(), EligibilityError> {
    if promotion.scope.users.is_empty() {
        return Ok(());
    }

    match ctx.caller {
        Caller::Anonymous => Err(EligibilityError::LoginRequired),
        Caller::User(user) if promotion.scope.users.contains(&user) => Ok(()),
        Caller::User(_) => Err(EligibilityError::NotEligible),
    }
}

fn check_listing_scope(
    promotion: &Promotion,
    ctx: &BookingContext,
) -> Result<(), EligibilityError> {
    if !promotion.scope.listings.is_empty() && !promotion.scope.listings.contains(&ctx.listing) {
        return Err(EligibilityError::NotEligible);
    }

    Ok(())
}

fn check_property_type_scope(
    promotion: &Promotion,
    ctx: &BookingContext,
) -> Result<(), EligibilityError> {
    if !promotion.scope.property_types.is_empty()
        && !promotion.scope.property_types.contains(&ctx.property_type)
    {
        return Err(EligibilityError::NotEligible);
    }

    Ok(())
}

fn check_tier_scope(promotion: &Promotion, ctx: &BookingContext) -> Result<(), EligibilityError> {
    if promotion.scope.tiers.is_empty() {
        return Ok(());
    }

    match ctx.tier {
        Some(tier) if promotion.scope.tiers.contains(&tier) => Ok(()),
        _ => Err(EligibilityError::NotEligible),
    }
}

fn check_membership_stacking(
    promotion: &Promotion,
    ctx: &BookingContext,
) -> Result<(), EligibilityError> {
    if !promotion.stacks_with_membership && ctx.membership_discount > 0 {
        return Err(EligibilityError::ConflictsWithMembership);
    }

    Ok(())
}

fn check_applied_code(promotion: &Promotion, ctx: &BookingContext) -> Result<(), EligibilityError> {
    match ctx.applied_code.as_deref() {
        Some(applied) if applied != promotion.code => Err(EligibilityError::AnotherCodeApplied),
        _ => Ok(()),
    }
}

fn check_minimum_value(
    promotion: &Promotion,
    ctx: &BookingContext,
) -> Result<(), EligibilityError> {
    if promotion
        .min_booking_value
        .is_some_and(|min| ctx.total_before_discounts < min)
    {
        return Err(EligibilityError::BelowMinimum);
    }

    Ok(())
}

fn raw_discount(promotion: &Promotion, ctx: &BookingContext) -> u64 {
    match &promotion.discount {
        SimpleDiscount::PercentageOff { rate, max_discount } => {
            let amount = percent_of_minor(ctx.total_before_discounts, *rate);

            match max_discount {
                Some(cap) => amount.min(*cap),
                None => amount,
            }
        }
        SimpleDiscount::FixedAmountOff { amount } => *amount,
    }
}
