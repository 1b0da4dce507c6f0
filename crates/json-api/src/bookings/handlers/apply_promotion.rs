//! Apply Promotion Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
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

/// Apply Promotion Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ApplyPromotionRequest {
    /// The promotion code to apply
    pub code: String,
}

/// Apply Promotion Handler
///
/// Applies a promotion code to a booking and returns the updated breakdown.
#[endpoint(
    tags("bookings"),
    summary = "Apply Promotion",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Promotion applied"),
        (status_code = StatusCode::BAD_REQUEST, description = "Promotion not eligible"),
        (status_code = StatusCode::NOT_FOUND, description = "Booking or promotion not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    booking: PathParam<Uuid>,
    json: JsonBody<ApplyPromotionRequest>,
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
        .apply_promotion(
            booking,
            identity.caller,
            &json.into_inner().code,
            Timestamp::now(),
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use stayrate::promotions::{Caller, eligibility::EligibilityError};
    use stayrate_app::domain::bookings::{MockBookingPricingService, PricingServiceError};

    use crate::test_helpers::{
        TEST_USER_UUID, anonymous_bookings_service, bookings_service, make_booking,
    };

    use super::*;

    fn make_service(bookings: MockBookingPricingService) -> Service {
        bookings_service(
            bookings,
            Router::with_path("bookings/{booking}/promotion").post(handler),
        )
    }

    #[tokio::test]
    async fn test_apply_returns_200_with_updated_breakdown() -> TestResult {
        let uuid = BookingUuid::now_v7();
        let booking = make_booking(uuid, Some(TEST_USER_UUID));

        let mut updated = booking.clone();
        updated.discount_total = 118_000;
        updated.total_price = 1_062_000;

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .withf(move |b| *b == uuid)
            .return_once(move |_| Ok(booking));

        bookings
            .expect_apply_promotion()
            .once()
            .withf(move |b, caller, code, _now| {
                *b == uuid && *caller == Caller::User(TEST_USER_UUID) && code == "SAVE10"
            })
            .return_once(move |_, _, _, _| Ok(updated));

        bookings.expect_remove_promotion().never();

        let mut res = TestClient::post(format!("http://example.com/bookings/{uuid}/promotion"))
            .json(&json!({ "code": "SAVE10" }))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: BookingResponse = res.take_json().await?;

        assert_eq!(body.discount_total, 118_000);
        assert_eq!(body.total_price, 1_062_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_expired_promotion_returns_400() -> TestResult {
        let uuid = BookingUuid::now_v7();
        let booking = make_booking(uuid, Some(TEST_USER_UUID));

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .return_once(move |_| Ok(booking));

        bookings
            .expect_apply_promotion()
            .once()
            .return_once(|_, _, _, _| {
                Err(PricingServiceError::Eligibility(EligibilityError::Expired))
            });

        let res = TestClient::post(format!("http://example.com/bookings/{uuid}/promotion"))
            .json(&json!({ "code": "SUMMER20" }))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_unknown_code_returns_404() -> TestResult {
        let uuid = BookingUuid::now_v7();
        let booking = make_booking(uuid, Some(TEST_USER_UUID));

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .return_once(move |_| Ok(booking));

        bookings
            .expect_apply_promotion()
            .once()
            .return_once(|_, _, _, _| Err(PricingServiceError::PromotionNotFound));

        let res = TestClient::post(format!("http://example.com/bookings/{uuid}/promotion"))
            .json(&json!({ "code": "NOSUCHCODE" }))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_apply_on_guest_booking_returns_401() -> TestResult {
        let uuid = BookingUuid::now_v7();
        let booking = make_booking(uuid, Some(Uuid::now_v7()));

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .return_once(move |_| Ok(booking));

        bookings.expect_apply_promotion().never();

        let res = TestClient::post(format!("http://example.com/bookings/{uuid}/promotion"))
            .json(&json!({ "code": "SAVE10" }))
            .send(&anonymous_bookings_service(
                bookings,
                Router::with_path("bookings/{booking}/promotion").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_user_restricted_code_returns_401() -> TestResult {
        let uuid = BookingUuid::now_v7();
        let booking = make_booking(uuid, None);

        let mut bookings = MockBookingPricingService::new();

        bookings
            .expect_get_breakdown()
            .once()
            .return_once(move |_| Ok(booking));

        bookings
            .expect_apply_promotion()
            .once()
            .withf(move |_, caller, _, _| *caller == Caller::Anonymous)
            .return_once(|_, _, _, _| {
                Err(PricingServiceError::Eligibility(
                    EligibilityError::LoginRequired,
                ))
            });

        let res = TestClient::post(format!("http://example.com/bookings/{uuid}/promotion"))
            .json(&json!({ "code": "MEMBERS10" }))
            .send(&anonymous_bookings_service(
                bookings,
                Router::with_path("bookings/{booking}/promotion").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
