//! Remove Promotion Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use stayrate_app::{auth::can_access_booking, domain::bookings::records::BookingUuid};

use crate::{
    bookings::{
        errors::{access_denied, into_status_error},
        models::BookingResponse,
    },
    extensions::*,
    state::State,
};

/// Remove Promotion Handler
///
/// Removes the applied promotion from a booking and returns the restored
/// breakdown.
#[endpoint(
    tags("bookings"),
    summary = "Remove Promotion",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Promotion removed"),
        (status_code = StatusCode::BAD_REQUEST, description = "No promotion applied"),
        (status_code = StatusCode::NOT_FOUND, description = "Booking not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    booking: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<BookingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_500()?;
    let booking = BookingUuid::from_uuid(booking.into_inner());

    let record = state
        .app
        .bookings
        .get_breakdown(booking)
        .await
        .map_err(into_status_error)?;

    if !can_access_booking(&record, &identity) {
        return Err(access_denied(&identity));
    }

    let updated = state
        .app
        .bookings
        .remove_promotion(booking, identity.caller, Timestamp::now())
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}
