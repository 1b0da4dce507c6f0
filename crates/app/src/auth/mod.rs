//! Identity resolution and the booking access predicate.
//!
//! Authentication itself is an external collaborator; this module resolves a
//! bearer token to a [`Identity`] and answers the one question the pricing
//! engine asks of it: may this identity touch this booking?

use async_trait::async_trait;
use mockall::automock;
use sqlx::{PgPool, Row, query};
use thiserror::Error;

use stayrate::promotions::Caller;

use crate::domain::bookings::records::BookingRecord;

const FIND_SESSION_SQL: &str = include_str!("sql/find_session.sql");

/// The resolved identity of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Anonymous or a specific user.
    pub caller: Caller,

    /// Whether the user is a platform administrator.
    pub is_admin: bool,
}

impl Identity {
    /// An unauthenticated request.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            caller: Caller::Anonymous,
            is_admin: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("session not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for IdentityError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}

#[automock]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolve a bearer token to an identity.
    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError>;
}

#[derive(Debug, Clone)]
pub struct PgIdentityService {
    pool: PgPool,
}

impl PgIdentityService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityService for PgIdentityService {
    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError> {
        let row = query(FIND_SESSION_SQL)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(IdentityError::NotFound)?;

        Ok(Identity {
            caller: Caller::User(row.try_get("user_uuid").map_err(IdentityError::Sql)?),
            is_admin: row.try_get("is_admin").map_err(IdentityError::Sql)?,
        })
    }
}

/// The booking access predicate: guest, host, admin, or anyone when the
/// booking has no registered guest (a walk-in booking).
#[must_use]
pub fn can_access_booking(booking: &BookingRecord, identity: &Identity) -> bool {
    if identity.is_admin || booking.guest.is_none() {
        return true;
    }

    match identity.caller.user() {
        Some(user) => booking.guest == Some(user) || booking.host == user,
        None => false,
    }
}
