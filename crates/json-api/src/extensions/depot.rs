//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use stayrate_app::auth::Identity;

const IDENTITY_KEY: &str = "stayrate.identity";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }
}

/// Carry the resolved caller identity from the auth middleware to handlers.
pub(crate) trait IdentityDepotExt {
    fn insert_identity(&mut self, identity: Identity);

    fn identity_or_500(&self) -> Result<Identity, StatusError>;
}

impl IdentityDepotExt for Depot {
    fn insert_identity(&mut self, identity: Identity) {
        self.insert(IDENTITY_KEY, identity);
    }

    fn identity_or_500(&self) -> Result<Identity, StatusError> {
        self.get::<Identity>(IDENTITY_KEY)
            .copied()
            .map_err(|_ignored| StatusError::internal_server_error())
    }
}
