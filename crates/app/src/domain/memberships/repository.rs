//! Memberships Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use stayrate::membership::{
    LoyaltyTier, MembershipSnapshot, MembershipStatus, PlanSnapshot,
};

use crate::domain::memberships::records::MembershipRecord;

const GET_MEMBERSHIP_SQL: &str = include_str!("sql/get_membership.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgMembershipsRepository;

impl PgMembershipsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Load the membership snapshot attached to a user, if one exists.
    pub(crate) async fn get_membership(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: Uuid,
    ) -> Result<Option<MembershipRecord>, sqlx::Error> {
        query_as::<Postgres, MembershipRecord>(GET_MEMBERSHIP_SQL)
            .bind(user)
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for MembershipRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: Option<String> = row.try_get("status")?;

        let snapshot = status
            .map(|status| decode_snapshot(row, &status))
            .transpose()?;

        let tier: Option<String> = row.try_get("loyalty_tier")?;

        let tier = tier
            .map(|slug| {
                LoyaltyTier::from_slug(&slug).ok_or_else(|| sqlx::Error::ColumnDecode {
                    index: "loyalty_tier".to_string(),
                    source: format!("unknown loyalty tier `{slug}`").into(),
                })
            })
            .transpose()?;

        Ok(Self { snapshot, tier })
    }
}

fn decode_snapshot(row: &PgRow, status: &str) -> Result<MembershipSnapshot, sqlx::Error> {
    let status = match status {
        "active" => MembershipStatus::Active,
        "past_due" => MembershipStatus::PastDue,
        "cancelled" => MembershipStatus::Cancelled,
        other => {
            return Err(sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: format!("unknown membership status `{other}`").into(),
            });
        }
    };

    let plan_name: Option<String> = row.try_get("plan_name")?;

    let plan = plan_name
        .map(|name| -> Result<PlanSnapshot, sqlx::Error> {
            let rate: Decimal = row.try_get("plan_rate")?;

            Ok(PlanSnapshot {
                name,
                slug: row.try_get("plan_slug")?,
                rate,
                includes_services: row.try_get("plan_includes_services")?,
            })
        })
        .transpose()?;

    Ok(MembershipSnapshot {
        status,
        expires_at: row
            .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
            .map(SqlxTimestamp::to_jiff),
        plan,
    })
}
