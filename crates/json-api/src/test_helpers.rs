//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use stayrate::promotions::Caller;
use stayrate_app::{
    auth::{Identity, MockIdentityService},
    context::AppContext,
    domain::bookings::{MockBookingPricingService, records::{BookingRecord, BookingUuid}},
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: Uuid = Uuid::nil();

#[salvo::handler]
pub(crate) async fn inject_user_identity(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_identity(Identity {
        caller: Caller::User(TEST_USER_UUID),
        is_admin: false,
    });
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_anonymous_identity(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_identity(Identity::anonymous());
    ctrl.call_next(req, depot, res).await;
}

fn strict_identity_mock() -> MockIdentityService {
    let mut identity = MockIdentityService::new();

    identity.expect_resolve().never();

    identity
}

fn strict_bookings_mock() -> MockBookingPricingService {
    let mut bookings = MockBookingPricingService::new();

    bookings.expect_get_breakdown().never();
    bookings.expect_apply_promotion().never();
    bookings.expect_remove_promotion().never();

    bookings
}

pub(crate) fn state_with_bookings(bookings: MockBookingPricingService) -> Arc<State> {
    Arc::new(State::new(AppContext::new(
        Arc::new(bookings),
        Arc::new(strict_identity_mock()),
    )))
}

pub(crate) fn state_with_identity(identity: MockIdentityService) -> Arc<State> {
    Arc::new(State::new(AppContext::new(
        Arc::new(strict_bookings_mock()),
        Arc::new(identity),
    )))
}

pub(crate) fn bookings_service(bookings: MockBookingPricingService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_bookings(bookings)))
            .hoop(inject_user_identity)
            .push(route),
    )
}

pub(crate) fn anonymous_bookings_service(
    bookings: MockBookingPricingService,
    route: Router,
) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_bookings(bookings)))
            .hoop(inject_anonymous_identity)
            .push(route),
    )
}

pub(crate) fn make_booking(uuid: BookingUuid, guest: Option<Uuid>) -> BookingRecord {
    BookingRecord {
        uuid,
        guest,
        host: Uuid::now_v7(),
        listing: Uuid::now_v7(),
        property_type: "apartment".to_string(),
        base_price: 1_000_000,
        nights: 2,
        services_total: 100_000,
        cleaning_fee: 50_000,
        platform_fee: 30_000,
        discount_total: 0,
        total_price: 1_180_000,
        adjustments: Vec::new(),
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
