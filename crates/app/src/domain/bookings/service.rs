//! Booking pricing service
//!
//! The redemption ledger: applies and removes promotion codes against a
//! booking so that "validate → price → persist booking → update redemption
//! row → move usage counter" commits or rolls back as one transaction. The
//! usage-counter cap is re-checked against a `FOR UPDATE` read taken inside
//! that same transaction, which is what keeps the counter at or under its
//! cap no matter how many redemptions race.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use stayrate::{
    membership::membership_discount,
    pricing::compose,
    promotions::{
        BookingContext, Caller,
        eligibility::{EligibilityError, resolve_discount},
    },
};

use crate::{
    database::Db,
    domain::{
        bookings::{
            errors::PricingServiceError,
            records::{BookingRecord, BookingUuid},
            repository::PgBookingsRepository,
        },
        memberships::repository::PgMembershipsRepository,
        promotions::repository::PgPromotionsRepository,
        redemptions::{records::RedemptionStatus, repository::PgRedemptionsRepository},
    },
    retry::RetryPolicy,
};

#[derive(Debug, Clone)]
pub struct PgBookingPricingService {
    db: Db,
    retry: RetryPolicy,
    bookings: PgBookingsRepository,
    promotions: PgPromotionsRepository,
    redemptions: PgRedemptionsRepository,
    memberships: PgMembershipsRepository,
}

impl PgBookingPricingService {
    #[must_use]
    pub fn new(db: Db, retry: RetryPolicy) -> Self {
        Self {
            db,
            retry,
            bookings: PgBookingsRepository::new(),
            promotions: PgPromotionsRepository::new(),
            redemptions: PgRedemptionsRepository::new(),
            memberships: PgMembershipsRepository::new(),
        }
    }

    async fn try_apply(
        &self,
        booking: BookingUuid,
        caller: Caller,
        code: &str,
        now: Timestamp,
    ) -> Result<BookingRecord, PricingServiceError> {
        let mut tx = self.db.begin().await?;

        let mut record = self
            .bookings
            .get_booking_for_update(&mut tx, booking)
            .await?
            .ok_or(PricingServiceError::BookingNotFound)?;

        let promo = self
            .promotions
            .find_by_code(&mut tx, code)
            .await?
            .ok_or(PricingServiceError::PromotionNotFound)?;

        let membership = match record.guest {
            Some(guest) => self.memberships.get_membership(&mut tx, guest).await?,
            None => None,
        };

        let snapshot = membership.as_ref().and_then(|m| m.snapshot.as_ref());
        let tier = membership.as_ref().and_then(|m| m.tier);

        let membership = membership_discount(
            snapshot,
            tier,
            record.base_price,
            record.services_total,
            now,
        );

        let ctx = BookingContext {
            listing: record.listing,
            property_type: record.property_type.clone(),
            caller,
            tier,
            total_before_discounts: record.totals().before_discounts(),
            membership_discount: membership.as_ref().map_or(0, |m| m.amount),
            applied_code: record.applied_promotion_code().map(str::to_string),
        };

        let discount = resolve_discount(&promo.promotion, &ctx, now)?;

        let composition = compose(record.totals(), membership.as_ref(), Some(&discount));

        self.bookings
            .update_pricing(&mut tx, booking, &composition)
            .await?;

        record.apply_composition(&composition);

        // Anonymous callers never create redemption rows and never move the
        // usage counter.
        if let Caller::User(user) = caller {
            let needs_increment = match self
                .redemptions
                .get_for_update(&mut tx, promo.uuid, user)
                .await?
            {
                None => {
                    self.redemptions
                        .insert_used(&mut tx, promo.uuid, user, booking)
                        .await?;

                    true
                }
                // Re-applying the code already on this booking is a no-op;
                // the counter must not move a second time.
                Some(row) if row.is_used_by(booking) => false,
                Some(row)
                    if row.status == RedemptionStatus::Used
                        && promo.promotion.max_uses_per_user.is_some() =>
                {
                    return Err(EligibilityError::UsageLimitReached.into());
                }
                Some(row) => {
                    self.redemptions.mark_used(&mut tx, row.uuid, booking).await?;

                    true
                }
            };

            if needs_increment {
                // The linchpin: the cap is checked against the counter as it
                // is inside this transaction, not a stale earlier read. A
                // lost race aborts the whole transaction, price update
                // included.
                let usage = self.promotions.lock_usage(&mut tx, promo.uuid).await?;

                if usage.is_exhausted() {
                    return Err(EligibilityError::UsageLimitReached.into());
                }

                self.promotions.increment_usage(&mut tx, promo.uuid).await?;
            }
        }

        tx.commit().await?;

        Ok(record)
    }

    async fn try_remove(
        &self,
        booking: BookingUuid,
    ) -> Result<BookingRecord, PricingServiceError> {
        let mut tx = self.db.begin().await?;

        let mut record = self
            .bookings
            .get_booking_for_update(&mut tx, booking)
            .await?
            .ok_or(PricingServiceError::BookingNotFound)?;

        let code = record
            .applied_promotion_code()
            .map(str::to_string)
            .ok_or(PricingServiceError::NothingApplied)?;

        // The membership entry is carried over verbatim so removal restores
        // the pre-promotion total exactly.
        let membership = record.membership_discount();

        let composition = compose(record.totals(), membership.as_ref(), None);

        self.bookings
            .update_pricing(&mut tx, booking, &composition)
            .await?;

        record.apply_composition(&composition);

        // The row is located by the booking it is consumed by, not by the
        // caller: a host or admin clearing a guest's code must release the
        // guest's row and counter slot. Anonymous applies created no row, so
        // nothing is found and nothing is decremented.
        if let Some(promo) = self.promotions.find_by_code(&mut tx, &code).await? {
            if let Some(row) = self
                .redemptions
                .find_for_booking(&mut tx, promo.uuid, booking)
                .await?
            {
                self.redemptions.mark_removed(&mut tx, row.uuid).await?;
                self.promotions.decrement_usage(&mut tx, promo.uuid).await?;
            }
        }

        tx.commit().await?;

        Ok(record)
    }
}

#[async_trait]
impl BookingPricingService for PgBookingPricingService {
    async fn get_breakdown(
        &self,
        booking: BookingUuid,
    ) -> Result<BookingRecord, PricingServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .bookings
            .get_booking(&mut tx, booking)
            .await?
            .ok_or(PricingServiceError::BookingNotFound)?;

        tx.commit().await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "bookings.service.apply_promotion",
        skip(self, code),
        fields(booking_uuid = %booking, anonymous = caller.user().is_none()),
        err
    )]
    async fn apply_promotion(
        &self,
        booking: BookingUuid,
        caller: Caller,
        code: &str,
        now: Timestamp,
    ) -> Result<BookingRecord, PricingServiceError> {
        let code = normalize_code(code)?;

        let record = self
            .retry
            .run(|| self.try_apply(booking, caller, &code, now))
            .await?;

        info!(booking_uuid = %booking, code, "applied promotion");

        Ok(record)
    }

    #[tracing::instrument(
        name = "bookings.service.remove_promotion",
        skip(self),
        fields(booking_uuid = %booking, anonymous = caller.user().is_none()),
        err
    )]
    async fn remove_promotion(
        &self,
        booking: BookingUuid,
        caller: Caller,
        _now: Timestamp,
    ) -> Result<BookingRecord, PricingServiceError> {
        let record = self.retry.run(|| self.try_remove(booking)).await?;

        info!(booking_uuid = %booking, "removed promotion");

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait BookingPricingService: Send + Sync {
    /// Read the booking's current price breakdown.
    async fn get_breakdown(
        &self,
        booking: BookingUuid,
    ) -> Result<BookingRecord, PricingServiceError>;

    /// Apply a promotion code to a booking and return the updated breakdown.
    async fn apply_promotion(
        &self,
        booking: BookingUuid,
        caller: Caller,
        code: &str,
        now: Timestamp,
    ) -> Result<BookingRecord, PricingServiceError>;

    /// Remove the applied promotion and return the updated breakdown.
    async fn remove_promotion(
        &self,
        booking: BookingUuid,
        caller: Caller,
        now: Timestamp,
    ) -> Result<BookingRecord, PricingServiceError>;
}

/// Trim, length-check and uppercase a submitted code.
fn normalize_code(code: &str) -> Result<String, PricingServiceError> {
    let code = code.trim();

    if !(3..=64).contains(&code.chars().count()) {
        return Err(PricingServiceError::InvalidCode);
    }

    Ok(code.to_uppercase())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;
    use uuid::Uuid;

    use crate::test::{
        TestContext,
        helpers::{promotion_use_count, seed_booking, seed_promotion},
    };

    use super::*;

    #[test]
    fn normalize_code_trims_and_uppercases() -> TestResult {
        assert_eq!(normalize_code("  welcome10 ")?, "WELCOME10");

        Ok(())
    }

    #[test]
    fn normalize_code_rejects_short_codes() {
        assert!(matches!(
            normalize_code("ab"),
            Err(PricingServiceError::InvalidCode)
        ));
    }

    #[test]
    fn normalize_code_rejects_long_codes() {
        let code = "X".repeat(65);

        assert!(matches!(
            normalize_code(&code),
            Err(PricingServiceError::InvalidCode)
        ));
    }

    #[test]
    fn normalize_code_rejects_whitespace_only() {
        assert!(matches!(
            normalize_code("   "),
            Err(PricingServiceError::InvalidCode)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_applies_stop_exactly_at_the_usage_cap() {
        let ctx = TestContext::new().await;

        seed_promotion(&ctx, "CROWD10", Some(3), None).await;

        let service = Arc::new(ctx.pricing.clone());
        let mut handles = Vec::new();

        // Eight racing redemptions, three slots. Every booking belongs to a
        // different user so the per-user ledger never interferes.
        for _ in 0..8 {
            let user = Uuid::now_v7();
            let booking = seed_booking(&ctx, Some(user)).await;
            let service = Arc::clone(&service);

            handles.push(tokio::spawn(async move {
                service
                    .apply_promotion(booking, Caller::User(user), "CROWD10", Timestamp::now())
                    .await
            }));
        }

        let mut applied = 0;
        let mut capped = 0;

        for handle in handles {
            match handle.await.expect("apply task should not panic") {
                Ok(_) => applied += 1,
                Err(PricingServiceError::Eligibility(EligibilityError::UsageLimitReached)) => {
                    capped += 1;
                }
                Err(other) => panic!("unexpected apply failure: {other:?}"),
            }
        }

        assert_eq!(applied, 3, "exactly the capped number of applies must win");
        assert_eq!(capped, 5, "every loser must see the usage limit");
        assert_eq!(
            promotion_use_count(&ctx, "CROWD10").await,
            3,
            "the stored counter must land exactly on the cap"
        );
    }

    #[tokio::test]
    async fn reapplying_the_applied_code_leaves_the_counter_alone() -> TestResult {
        let ctx = TestContext::new().await;

        seed_promotion(&ctx, "SAVE10", None, None).await;

        let user = Uuid::now_v7();
        let booking = seed_booking(&ctx, Some(user)).await;

        let first = ctx
            .pricing
            .apply_promotion(booking, Caller::User(user), "SAVE10", Timestamp::now())
            .await?;

        assert_eq!(first.total_price, 1_062_000);

        let second = ctx
            .pricing
            .apply_promotion(booking, Caller::User(user), "SAVE10", Timestamp::now())
            .await?;

        assert_eq!(second.total_price, first.total_price);
        assert_eq!(
            promotion_use_count(&ctx, "SAVE10").await,
            1,
            "a no-op reapply must not move the counter"
        );

        Ok(())
    }

    #[tokio::test]
    async fn a_per_user_code_is_released_by_removal() -> TestResult {
        let ctx = TestContext::new().await;

        seed_promotion(&ctx, "ONCEONLY", None, Some(1)).await;

        let user = Uuid::now_v7();
        let first_booking = seed_booking(&ctx, Some(user)).await;
        let second_booking = seed_booking(&ctx, Some(user)).await;

        ctx.pricing
            .apply_promotion(first_booking, Caller::User(user), "ONCEONLY", Timestamp::now())
            .await?;

        let blocked = ctx
            .pricing
            .apply_promotion(second_booking, Caller::User(user), "ONCEONLY", Timestamp::now())
            .await;

        assert!(
            matches!(
                blocked,
                Err(PricingServiceError::Eligibility(
                    EligibilityError::UsageLimitReached
                ))
            ),
            "a second booking must not hold the same per-user code, got {blocked:?}"
        );

        ctx.pricing
            .remove_promotion(first_booking, Caller::User(user), Timestamp::now())
            .await?;

        ctx.pricing
            .apply_promotion(second_booking, Caller::User(user), "ONCEONLY", Timestamp::now())
            .await?;

        assert_eq!(promotion_use_count(&ctx, "ONCEONLY").await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn removal_by_another_caller_frees_the_redeemers_slot() -> TestResult {
        let ctx = TestContext::new().await;

        seed_promotion(&ctx, "GUESTDEAL", None, Some(1)).await;

        let guest = Uuid::now_v7();
        let booking = seed_booking(&ctx, Some(guest)).await;

        ctx.pricing
            .apply_promotion(booking, Caller::User(guest), "GUESTDEAL", Timestamp::now())
            .await?;

        // A different caller, e.g. the host, clears the code.
        let host = Uuid::now_v7();

        let cleared = ctx
            .pricing
            .remove_promotion(booking, Caller::User(host), Timestamp::now())
            .await?;

        assert!(cleared.applied_promotion_code().is_none());
        assert_eq!(cleared.total_price, 1_180_000);
        assert_eq!(
            promotion_use_count(&ctx, "GUESTDEAL").await,
            0,
            "removal must release the redeeming guest's slot"
        );

        // The guest can redeem again.
        ctx.pricing
            .apply_promotion(booking, Caller::User(guest), "GUESTDEAL", Timestamp::now())
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn anonymous_applies_never_touch_the_ledger() -> TestResult {
        let ctx = TestContext::new().await;

        seed_promotion(&ctx, "WALKIN10", Some(5), None).await;

        let booking = seed_booking(&ctx, None).await;

        let priced = ctx
            .pricing
            .apply_promotion(booking, Caller::Anonymous, "WALKIN10", Timestamp::now())
            .await?;

        assert_eq!(priced.total_price, 1_062_000);
        assert_eq!(
            promotion_use_count(&ctx, "WALKIN10").await,
            0,
            "anonymous redemptions must not consume counter slots"
        );

        Ok(())
    }

    #[tokio::test]
    async fn a_stored_per_user_cap_above_one_fails_loudly() {
        let ctx = TestContext::new().await;

        seed_promotion(&ctx, "TWICEPER", None, Some(2)).await;

        let user = Uuid::now_v7();
        let booking = seed_booking(&ctx, Some(user)).await;

        let result = ctx
            .pricing
            .apply_promotion(booking, Caller::User(user), "TWICEPER", Timestamp::now())
            .await;

        assert!(
            matches!(result, Err(PricingServiceError::Sql(_))),
            "an unrepresentable per-user cap must fail at decode, got {result:?}"
        );
    }
}
