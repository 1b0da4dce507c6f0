//! Booking pricing service errors.

use sqlx::Error;
use thiserror::Error;

use stayrate::promotions::eligibility::EligibilityError;

use crate::retry::{TransientError, is_serialization_failure};

#[derive(Debug, Error)]
pub enum PricingServiceError {
    #[error("booking not found")]
    BookingNotFound,

    #[error("promotion code not found")]
    PromotionNotFound,

    #[error("promotion code must be 3 to 64 characters")]
    InvalidCode,

    #[error("no promotion is applied to this booking")]
    NothingApplied,

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    /// Retried internally by the ledger's retry policy; only surfaces once
    /// the attempt bound is exhausted.
    #[error("transient storage conflict")]
    TransientConflict(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PricingServiceError {
    fn from(error: Error) -> Self {
        if is_serialization_failure(&error) {
            return Self::TransientConflict(error);
        }

        // Two first-time redemptions by the same user can race on the
        // (promotion, user) unique key; a retry finds the winner's row and
        // proceeds down the update path.
        if matches!(
            error
                .as_database_error()
                .map(sqlx::error::DatabaseError::kind),
            Some(sqlx::error::ErrorKind::UniqueViolation)
        ) {
            return Self::TransientConflict(error);
        }

        Self::Sql(error)
    }
}

impl TransientError for PricingServiceError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::TransientConflict(_))
    }
}
