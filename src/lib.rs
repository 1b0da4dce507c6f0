//! Stayrate core
//!
//! Pure pricing and promotion rules for bookings: discount eligibility,
//! membership discounts, price composition, and the dynamic rate advisor.
//! Everything in this crate is side-effect free; persistence and the
//! redemption ledger live in `stayrate-app`.

pub mod adjustments;
pub mod advisor;
pub mod membership;
pub mod pricing;
pub mod promotions;
