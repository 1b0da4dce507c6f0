//! Promotions Repository
//!
//! Reads promotion rules and owns the usage-counter statements. The counter
//! is only ever read for increment under `FOR UPDATE` inside the redemption
//! transaction; a stale pre-transaction read is never trusted for the cap
//! check.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use stayrate::{
    membership::LoyaltyTier,
    promotions::{Promotion, PromotionScope, SimpleDiscount},
};

use crate::domain::{
    bookings::repository::try_get_amount,
    promotions::records::{PromotionRecord, PromotionUsage, PromotionUuid},
};

const FIND_PROMOTION_BY_CODE_SQL: &str = include_str!("sql/find_promotion_by_code.sql");
const LOCK_PROMOTION_USAGE_SQL: &str = include_str!("sql/lock_promotion_usage.sql");
const INCREMENT_PROMOTION_USAGE_SQL: &str = include_str!("sql/increment_promotion_usage.sql");
const DECREMENT_PROMOTION_USAGE_SQL: &str = include_str!("sql/decrement_promotion_usage.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPromotionsRepository;

impl PgPromotionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Look up an active promotion by its normalized code.
    pub(crate) async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<PromotionRecord>, sqlx::Error> {
        query_as::<Postgres, PromotionRecord>(FIND_PROMOTION_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Re-read the live usage counter under `FOR UPDATE`.
    pub(crate) async fn lock_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
    ) -> Result<PromotionUsage, sqlx::Error> {
        let row = query(LOCK_PROMOTION_USAGE_SQL)
            .bind(promotion.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(PromotionUsage {
            use_count: try_get_amount(&row, "use_count")?,
            max_uses: try_get_optional_amount(&row, "max_uses")?,
        })
    }

    pub(crate) async fn increment_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
    ) -> Result<(), sqlx::Error> {
        query(INCREMENT_PROMOTION_USAGE_SQL)
            .bind(promotion.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Decrement the counter, never below zero.
    pub(crate) async fn decrement_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
    ) -> Result<(), sqlx::Error> {
        query(DECREMENT_PROMOTION_USAGE_SQL)
            .bind(promotion.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for PromotionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let discount = decode_discount(row)?;

        let max_uses_per_user: Option<i32> = row.try_get("max_uses_per_user")?;

        // One redemption row is kept per (promotion, user), which can only
        // enforce a cap of exactly 1; refuse rows promising anything else.
        let max_uses_per_user = max_uses_per_user
            .map(|value| match u32::try_from(value) {
                Ok(1) => Ok(1),
                _ => Err(sqlx::Error::ColumnDecode {
                    index: "max_uses_per_user".to_string(),
                    source: format!("per-user cap must be 1 when set, got {value}").into(),
                }),
            })
            .transpose()?;

        let promotion = Promotion {
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            discount,
            valid_from: row
                .try_get::<Option<SqlxTimestamp>, _>("valid_from")?
                .map(SqlxTimestamp::to_jiff),
            valid_until: row
                .try_get::<Option<SqlxTimestamp>, _>("valid_until")?
                .map(SqlxTimestamp::to_jiff),
            min_booking_value: try_get_optional_amount(row, "min_booking_value")?,
            scope: decode_scope(row)?,
            stacks_with_membership: row.try_get("stacks_with_membership")?,
            stacks_with_promotions: row.try_get("stacks_with_promotions")?,
            use_count: try_get_amount(row, "use_count")?,
            max_uses: try_get_optional_amount(row, "max_uses")?,
            max_uses_per_user,
        };

        Ok(Self {
            uuid: PromotionUuid::from_uuid(row.try_get("uuid")?),
            promotion,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

fn decode_discount(row: &PgRow) -> Result<SimpleDiscount, sqlx::Error> {
    let kind: String = row.try_get("discount_kind")?;

    match kind.as_str() {
        "percentage" => {
            let rate: Decimal = row.try_get("discount_rate")?;

            Ok(SimpleDiscount::PercentageOff {
                rate,
                max_discount: try_get_optional_amount(row, "max_discount")?,
            })
        }
        "fixed_amount" => Ok(SimpleDiscount::FixedAmountOff {
            amount: try_get_amount(row, "discount_amount")?,
        }),
        other => Err(sqlx::Error::ColumnDecode {
            index: "discount_kind".to_string(),
            source: format!("unknown discount kind `{other}`").into(),
        }),
    }
}

fn decode_scope(row: &PgRow) -> Result<PromotionScope, sqlx::Error> {
    let listings: Option<Vec<Uuid>> = row.try_get("listing_scope")?;
    let property_types: Option<Vec<String>> = row.try_get("property_type_scope")?;
    let tier_slugs: Option<Vec<String>> = row.try_get("tier_scope")?;
    let users: Option<Vec<Uuid>> = row.try_get("user_scope")?;

    let tiers = tier_slugs
        .unwrap_or_default()
        .iter()
        .map(|slug| {
            LoyaltyTier::from_slug(slug).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "tier_scope".to_string(),
                source: format!("unknown loyalty tier `{slug}`").into(),
            })
        })
        .collect::<Result<FxHashSet<_>, _>>()?;

    Ok(PromotionScope {
        listings: listings.unwrap_or_default().into_iter().collect(),
        property_types: property_types.unwrap_or_default().into_iter().collect(),
        tiers,
        users: users.unwrap_or_default().into_iter().collect(),
    })
}

fn try_get_optional_amount(row: &PgRow, col: &str) -> Result<Option<u64>, sqlx::Error> {
    let amount: Option<i64> = row.try_get(col)?;

    amount
        .map(|value| {
            u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
                index: col.to_string(),
                source: Box::new(e),
            })
        })
        .transpose()
}
