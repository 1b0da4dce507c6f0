//! Errors

use salvo::http::StatusError;
use tracing::error;

use stayrate::promotions::{Caller, eligibility::EligibilityError};
use stayrate_app::{auth::Identity, domain::bookings::PricingServiceError};

pub(crate) fn into_status_error(error: PricingServiceError) -> StatusError {
    match error {
        PricingServiceError::BookingNotFound => StatusError::not_found().brief("Booking not found"),
        PricingServiceError::PromotionNotFound => {
            StatusError::not_found().brief("Promotion code not found")
        }
        PricingServiceError::InvalidCode | PricingServiceError::NothingApplied => {
            StatusError::bad_request().brief(error.to_string())
        }
        PricingServiceError::Eligibility(EligibilityError::LoginRequired) => {
            StatusError::unauthorized().brief("Sign in to use this promotion code")
        }
        PricingServiceError::Eligibility(reason) => {
            StatusError::bad_request().brief(reason.to_string())
        }
        PricingServiceError::TransientConflict(source) => {
            error!("promotion redemption still conflicting after retries: {source}");

            StatusError::internal_server_error()
        }
        PricingServiceError::Sql(source) => {
            error!("pricing storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

/// Denial for callers the booking access predicate rejects: anonymous
/// callers are asked to sign in, signed-in strangers are forbidden.
pub(crate) fn access_denied(identity: &Identity) -> StatusError {
    match identity.caller {
        Caller::Anonymous => StatusError::unauthorized().brief("Sign in to view this booking"),
        Caller::User(_) => {
            StatusError::forbidden().brief("You do not have access to this booking")
        }
    }
}
