//! Redemptions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::{
    bookings::records::BookingUuid,
    promotions::records::PromotionUuid,
    redemptions::records::{RedemptionRecord, RedemptionStatus, RedemptionUuid},
};

const GET_REDEMPTION_FOR_UPDATE_SQL: &str = include_str!("sql/get_redemption_for_update.sql");
const FIND_REDEMPTION_FOR_BOOKING_SQL: &str = include_str!("sql/find_redemption_for_booking.sql");
const INSERT_REDEMPTION_USED_SQL: &str = include_str!("sql/insert_redemption_used.sql");
const MARK_REDEMPTION_USED_SQL: &str = include_str!("sql/mark_redemption_used.sql");
const MARK_REDEMPTION_REMOVED_SQL: &str = include_str!("sql/mark_redemption_removed.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRedemptionsRepository;

impl PgRedemptionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Fetch the (promotion, user) row with a `FOR UPDATE` lock so two
    /// redemptions by the same user serialize.
    pub(crate) async fn get_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        user: Uuid,
    ) -> Result<Option<RedemptionRecord>, sqlx::Error> {
        query_as::<Postgres, RedemptionRecord>(GET_REDEMPTION_FOR_UPDATE_SQL)
            .bind(promotion.into_uuid())
            .bind(user)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Fetch the row consumed by the given booking, whoever redeemed it.
    /// Removal goes through this lookup so a host or admin clearing a code
    /// releases the redeeming guest's row, not their own.
    pub(crate) async fn find_for_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        booking: BookingUuid,
    ) -> Result<Option<RedemptionRecord>, sqlx::Error> {
        query_as::<Postgres, RedemptionRecord>(FIND_REDEMPTION_FOR_BOOKING_SQL)
            .bind(promotion.into_uuid())
            .bind(booking.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Create a row already consumed by the given booking.
    pub(crate) async fn insert_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        user: Uuid,
        booking: BookingUuid,
    ) -> Result<(), sqlx::Error> {
        query(INSERT_REDEMPTION_USED_SQL)
            .bind(RedemptionUuid::now_v7().into_uuid())
            .bind(promotion.into_uuid())
            .bind(user)
            .bind(booking.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Flip an existing row to `used`, linked to the given booking.
    pub(crate) async fn mark_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemption: RedemptionUuid,
        booking: BookingUuid,
    ) -> Result<(), sqlx::Error> {
        query(MARK_REDEMPTION_USED_SQL)
            .bind(redemption.into_uuid())
            .bind(booking.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Flip a row back to `active` and unlink its booking.
    pub(crate) async fn mark_removed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemption: RedemptionUuid,
    ) -> Result<(), sqlx::Error> {
        query(MARK_REDEMPTION_REMOVED_SQL)
            .bind(redemption.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for RedemptionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status =
            RedemptionStatus::from_str(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: format!("unknown redemption status `{status}`").into(),
            })?;

        let booking: Option<Uuid> = row.try_get("booking_uuid")?;

        Ok(Self {
            uuid: RedemptionUuid::from_uuid(row.try_get("uuid")?),
            promotion: PromotionUuid::from_uuid(row.try_get("promotion_uuid")?),
            user: row.try_get("user_uuid")?,
            status,
            booking: booking.map(BookingUuid::from_uuid),
            applied_at: row
                .try_get::<Option<SqlxTimestamp>, _>("applied_at")?
                .map(SqlxTimestamp::to_jiff),
            removed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("removed_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
