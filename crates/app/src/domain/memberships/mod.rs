//! Memberships domain: read-only membership and loyalty snapshots.

pub mod records;
pub(crate) mod repository;
