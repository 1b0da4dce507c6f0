//! Extension traits

mod depot;

pub(crate) use depot::DepotExt as _;
pub(crate) use depot::IdentityDepotExt as _;
