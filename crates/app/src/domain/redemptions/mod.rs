//! Redemptions domain: one row per (promotion, user) pair.

pub mod records;
pub(crate) mod repository;
