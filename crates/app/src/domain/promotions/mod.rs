//! Promotions domain: stored promotion rules and their usage counters.

pub mod records;
pub(crate) mod repository;
