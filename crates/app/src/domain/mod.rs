//! Domain modules

pub mod bookings;
pub mod memberships;
pub mod promotions;
pub mod redemptions;
