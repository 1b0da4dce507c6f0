//! Forecast Handler

use jiff::Zoned;
use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use stayrate::advisor::{self, DailyRate};

const DEFAULT_HORIZON_DAYS: u16 = 90;
const MAX_HORIZON_DAYS: u16 = 365;

/// One day of the rate forecast
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DailyRateResponse {
    /// The night being priced
    pub date: String,

    /// Suggested rate for a one-night stay in minor units
    pub suggested: u64,
}

impl From<DailyRate> for DailyRateResponse {
    fn from(rate: DailyRate) -> Self {
        Self {
            date: rate.date.to_string(),
            suggested: rate.suggested,
        }
    }
}

/// Rate Forecast Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ForecastResponse {
    /// Day-by-day suggested rates, starting today
    pub rates: Vec<DailyRateResponse>,
}

/// Forecast Handler
///
/// Produces a day-by-day forecast of one-night rates over a horizon.
#[endpoint(tags("pricing"), summary = "Forecast Nightly Rates")]
pub(crate) async fn handler(
    base_price: QueryParam<u64, true>,
    days: QueryParam<u16, false>,
) -> Json<ForecastResponse> {
    let horizon = days
        .into_inner()
        .unwrap_or(DEFAULT_HORIZON_DAYS)
        .min(MAX_HORIZON_DAYS);

    let today = Zoned::now().date();

    let rates = advisor::forecast(base_price.into_inner(), today, horizon)
        .into_iter()
        .map(DailyRateResponse::from)
        .collect();

    Json(ForecastResponse { rates })
}
