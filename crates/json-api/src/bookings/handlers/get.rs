//! Get Booking Handler

use std::sync::Arc;

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

/// Get Booking Handler
///
/// Returns the booking's current price breakdown.
#[endpoint(
    tags("bookings"),
    summary = "Get Booking Breakdown",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(
    booking: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<BookingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_500()?;

    let record = state
        .app
        .bookings
        .get_breakdown(BookingUuid::from_uuid(booking.into_inner()))
        .await
        .map_err(into_status_error)?;

    if !can_access_booking(&record, &identity) {
        return Err(access_denied(&identity));
    }

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use stayrate_app::domain::bookings::{MockBookingPricingService, PricingServiceError};

    use crate::test_helpers::{TEST_USER_UUID, bookings_service, make_booking};

    use super::*;

    fn make_service(bookings: MockBookingPricingService) -> Service {
        bookings_service(bookings, Router::with_path("bookings/{booking}").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_200_with_breakdown() -> TestResult {
        let uuid = BookingUuid::now_v7();
        let booking = make_booking(uuid, Some(TEST_USER_UUID));

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .withf(move |b| *b == uuid)
            .return_once(move |_| Ok(booking));

        bookings.expect_apply_promotion().never();
        bookings.expect_remove_promotion().never();

        let mut res = TestClient::get(format!("http://example.com/bookings/{uuid}"))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: BookingResponse = res.take_json().await?;

        assert_eq!(body.uuid, uuid.into_uuid());
        assert_eq!(body.total_price, 1_180_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_booking_returns_404() -> TestResult {
        let uuid = BookingUuid::now_v7();

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .return_once(|_| Err(PricingServiceError::BookingNotFound));

        let res = TestClient::get(format!("http://example.com/bookings/{uuid}"))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_strangers_booking_returns_403() -> TestResult {
        let uuid = BookingUuid::now_v7();
        let booking = make_booking(uuid, Some(Uuid::now_v7()));

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .return_once(move |_| Ok(booking));

        let res = TestClient::get(format!("http://example.com/bookings/{uuid}"))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
