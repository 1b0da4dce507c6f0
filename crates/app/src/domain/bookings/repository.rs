//! Bookings Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use stayrate::{adjustments::Adjustment, pricing::Composition};

use crate::domain::bookings::records::{BookingRecord, BookingUuid};

const GET_BOOKING_SQL: &str = include_str!("sql/get_booking.sql");
const GET_BOOKING_FOR_UPDATE_SQL: &str = include_str!("sql/get_booking_for_update.sql");
const UPDATE_BOOKING_PRICING_SQL: &str = include_str!("sql/update_booking_pricing.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgBookingsRepository;

impl PgBookingsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<Option<BookingRecord>, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(GET_BOOKING_SQL)
            .bind(booking.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Read the booking row with a `FOR UPDATE` lock so concurrent apply and
    /// remove calls against the same booking serialize.
    pub(crate) async fn get_booking_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<Option<BookingRecord>, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(GET_BOOKING_FOR_UPDATE_SQL)
            .bind(booking.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update_pricing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
        composition: &Composition,
    ) -> Result<(), sqlx::Error> {
        let discount_total = try_i64_from_u64(composition.total_discount, "discount_total")?;
        let total_price = try_i64_from_u64(composition.total, "total_price")?;

        query(UPDATE_BOOKING_PRICING_SQL)
            .bind(booking.into_uuid())
            .bind(discount_total)
            .bind(total_price)
            .bind(Json(composition.adjustments.to_vec()))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for BookingRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let nights: i32 = row.try_get("nights")?;

        let nights = u32::try_from(nights).map_err(|e| sqlx::Error::ColumnDecode {
            index: "nights".to_string(),
            source: Box::new(e),
        })?;

        let adjustments: Json<Vec<Adjustment>> = row.try_get("adjustments")?;

        Ok(Self {
            uuid: BookingUuid::from_uuid(row.try_get("uuid")?),
            guest: row.try_get("guest_uuid")?,
            host: row.try_get("host_uuid")?,
            listing: row.try_get("listing_uuid")?,
            property_type: row.try_get("property_type")?,
            base_price: try_get_amount(row, "base_price")?,
            nights,
            services_total: try_get_amount(row, "services_total")?,
            cleaning_fee: try_get_amount(row, "cleaning_fee")?,
            platform_fee: try_get_amount(row, "platform_fee")?,
            discount_total: try_get_amount(row, "discount_total")?,
            total_price: try_get_amount(row, "total_price")?,
            adjustments: adjustments.0,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(col)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn try_i64_from_u64(value: u64, column: &'static str) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
