//! Bookings HTTP surface: price breakdown and promotion apply/remove.

pub(crate) mod errors;
mod handlers;
pub(crate) mod models;

pub(crate) use handlers::{apply_promotion, get, remove_promotion};
