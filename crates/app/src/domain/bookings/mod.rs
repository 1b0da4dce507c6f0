//! Bookings domain: price breakdowns and the promotion redemption ledger.

pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::PricingServiceError;
pub use service::{BookingPricingService, MockBookingPricingService, PgBookingPricingService};
