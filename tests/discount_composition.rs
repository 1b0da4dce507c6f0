//! Integration tests for discount resolution and price composition

use jiff::Timestamp;
use rust_decimal::Decimal;
use testresult::TestResult;
use uuid::Uuid;

use stayrate::{
    membership::{
        MembershipDiscount, MembershipSnapshot, MembershipStatus, PlanSnapshot,
        membership_discount,
    },
    pricing::{BookingTotals, compose, percent_of_minor},
    promotions::{
        BookingContext, Caller, Promotion, PromotionScope, SimpleDiscount,
        eligibility::{EligibilityError, resolve_discount},
    },
};

fn promotion(discount: SimpleDiscount) -> Promotion {
    Promotion {
        code: "SAVE10".to_string(),
        name: "Save 10%".to_string(),
        discount,
        valid_from: None,
        valid_until: None,
        min_booking_value: None,
        scope: PromotionScope::unrestricted(),
        stacks_with_membership: true,
        stacks_with_promotions: false,
        use_count: 0,
        max_uses: None,
        max_uses_per_user: None,
    }
}

fn context(total_before: u64, membership: u64) -> BookingContext {
    BookingContext {
        listing: Uuid::now_v7(),
        property_type: "apartment".to_string(),
        caller: Caller::User(Uuid::now_v7()),
        tier: None,
        total_before_discounts: total_before,
        membership_discount: membership,
        applied_code: None,
    }
}

#[test]
fn percentage_discount_is_rounded_then_capped() -> TestResult {
    let now = Timestamp::now();

    // 12.5% of 1,000,000 is 125,000; the cap brings it down to 100,000.
    let capped = promotion(SimpleDiscount::PercentageOff {
        rate: Decimal::new(125, 1),
        max_discount: Some(100_000),
    });

    let discount = resolve_discount(&capped, &context(1_000_000, 0), now)?;

    assert_eq!(discount.amount, 100_000);

    // 7% of 999 is 69.93, rounded half away from zero to 70.
    let uncapped = promotion(SimpleDiscount::PercentageOff {
        rate: Decimal::from(7),
        max_discount: None,
    });

    let discount = resolve_discount(&uncapped, &context(999, 0), now)?;

    assert_eq!(discount.amount, 70);
    assert_eq!(discount.amount, percent_of_minor(999, Decimal::from(7)));

    Ok(())
}

#[test]
fn promotion_discount_never_exceeds_subtotal_less_membership() -> TestResult {
    let now = Timestamp::now();

    let generous = promotion(SimpleDiscount::FixedAmountOff { amount: 500_000 });

    let discount = resolve_discount(&generous, &context(400_000, 150_000), now)?;

    assert_eq!(discount.amount, 250_000);

    Ok(())
}

#[test]
fn discount_swallowed_by_membership_is_rejected() -> TestResult {
    let now = Timestamp::now();

    let fixed = promotion(SimpleDiscount::FixedAmountOff { amount: 50_000 });

    let result = resolve_discount(&fixed, &context(200_000, 200_000), now);

    assert_eq!(result, Err(EligibilityError::NoEffectiveDiscount));

    Ok(())
}

#[test]
fn apply_then_remove_restores_the_total_exactly() -> TestResult {
    let now = Timestamp::now();

    let membership = MembershipDiscount {
        amount: 100_000,
        rate: Decimal::from(10),
        includes_services: false,
        label: "Stayrate Plus".to_string(),
    };

    // A booking already carrying its membership discount.
    let before = BookingTotals {
        total: 1_080_000,
        discount: 100_000,
    };

    let percentage = promotion(SimpleDiscount::PercentageOff {
        rate: Decimal::from(10),
        max_discount: None,
    });

    let discount = resolve_discount(
        &percentage,
        &context(before.before_discounts(), membership.amount),
        now,
    )?;

    let applied = compose(before, Some(&membership), Some(&discount));

    assert_eq!(applied.total_discount, 100_000 + discount.amount);
    assert!(applied.total < before.total, "promotion should lower the total");

    // Removing the promotion recomposes from the applied totals and lands
    // back on the original numbers.
    let removed = compose(
        BookingTotals {
            total: applied.total,
            discount: applied.total_discount,
        },
        Some(&membership),
        None,
    );

    assert_eq!(removed.total, before.total);
    assert_eq!(removed.total_discount, before.discount);

    Ok(())
}

#[test]
fn ten_percent_plan_on_a_million_excluding_services() -> TestResult {
    let now = Timestamp::now();

    let snapshot = MembershipSnapshot {
        status: MembershipStatus::Active,
        expires_at: None,
        plan: Some(PlanSnapshot {
            name: "Stayrate Plus".to_string(),
            slug: "stayrate-plus".to_string(),
            rate: Decimal::from(10),
            includes_services: false,
        }),
    };

    let discount = membership_discount(Some(&snapshot), None, 1_000_000, 250_000, now)
        .ok_or("expected a membership discount")?;

    assert_eq!(discount.amount, 100_000);
    assert!(!discount.includes_services);

    // A promotion that refuses to stack with membership is rejected while
    // that discount is in effect.
    let mut exclusive = promotion(SimpleDiscount::FixedAmountOff { amount: 25_000 });
    exclusive.stacks_with_membership = false;

    let result = resolve_discount(&exclusive, &context(1_250_000, discount.amount), now);

    assert_eq!(result, Err(EligibilityError::ConflictsWithMembership));

    Ok(())
}

#[test]
fn only_a_different_applied_code_blocks_resolution() -> TestResult {
    let now = Timestamp::now();

    let percentage = promotion(SimpleDiscount::PercentageOff {
        rate: Decimal::from(10),
        max_discount: None,
    });

    let mut ctx = context(1_000_000, 0);
    ctx.applied_code = Some("WINTER20".to_string());

    let result = resolve_discount(&percentage, &ctx, now);

    assert_eq!(result, Err(EligibilityError::AnotherCodeApplied));

    // The code already on the booking resolves cleanly; the ledger treats
    // that case as a no-op instead of double-counting usage.
    ctx.applied_code = Some("SAVE10".to_string());

    assert!(resolve_discount(&percentage, &ctx, now).is_ok());

    Ok(())
}
