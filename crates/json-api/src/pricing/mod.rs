//! Pricing HTTP surface: dynamic price advisor endpoints.

mod handlers;

pub(crate) use handlers::{compare, forecast, suggest};
