//! Test Helpers
//!
//! Row seeding for service-level tests. Amounts mirror the fixture used by
//! the HTTP layer: a 1,000,000 stay with 180,000 of fees and services.

use uuid::Uuid;

use crate::{domain::bookings::records::BookingUuid, test::TestContext};

/// Insert a booking with known totals and return its id.
pub(crate) async fn seed_booking(ctx: &TestContext, guest: Option<Uuid>) -> BookingUuid {
    let uuid = BookingUuid::now_v7();

    sqlx::query(
        "INSERT INTO bookings (uuid, guest_uuid, host_uuid, listing_uuid, property_type,
                               base_price, nights, services_total, cleaning_fee, platform_fee,
                               discount_total, total_price)
         VALUES ($1, $2, $3, $4, 'apartment', 1000000, 2, 100000, 50000, 30000, 0, 1180000)",
    )
    .bind(uuid.into_uuid())
    .bind(guest)
    .bind(Uuid::now_v7())
    .bind(Uuid::now_v7())
    .execute(ctx.db.pool())
    .await
    .expect("seeding a booking should succeed");

    uuid
}

/// Insert an unrestricted 10%-off promotion with the given caps.
pub(crate) async fn seed_promotion(
    ctx: &TestContext,
    code: &str,
    max_uses: Option<i64>,
    max_uses_per_user: Option<i32>,
) {
    sqlx::query(
        "INSERT INTO promotions (uuid, code, name, discount_kind, discount_rate,
                                 stacks_with_membership, stacks_with_promotions,
                                 use_count, max_uses, max_uses_per_user)
         VALUES ($1, $2, $3, 'percentage', 10, false, false, 0, $4, $5)",
    )
    .bind(Uuid::now_v7())
    .bind(code)
    .bind(format!("{code} promotion"))
    .bind(max_uses)
    .bind(max_uses_per_user)
    .execute(ctx.db.pool())
    .await
    .expect("seeding a promotion should succeed");
}

/// Read a promotion's usage counter straight off the table.
pub(crate) async fn promotion_use_count(ctx: &TestContext, code: &str) -> i64 {
    sqlx::query_scalar("SELECT use_count FROM promotions WHERE code = $1")
        .bind(code)
        .fetch_one(ctx.db.pool())
        .await
        .expect("reading the usage counter should succeed")
}
