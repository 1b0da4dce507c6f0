//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{IdentityService, PgIdentityService},
    database::{self, Db},
    domain::bookings::{BookingPricingService, PgBookingPricingService},
    retry::RetryPolicy,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub bookings: Arc<dyn BookingPricingService>,
    pub identity: Arc<dyn IdentityService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str, max_connections: u32) -> Result<Self, AppInitError> {
        let pool = database::connect(url, max_connections)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool.clone());

        Ok(Self {
            bookings: Arc::new(PgBookingPricingService::new(db, RetryPolicy::default())),
            identity: Arc::new(PgIdentityService::new(pool)),
        })
    }

    /// Assemble a context from already-built services; used by tests.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingPricingService>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        Self { bookings, identity }
    }
}
