//! Booking Handlers

pub(crate) mod apply_promotion;
pub(crate) mod get;
pub(crate) mod remove_promotion;
