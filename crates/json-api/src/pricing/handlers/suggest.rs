//! Suggest Price Handler

use jiff::Zoned;
use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use stayrate::advisor::{self, Multipliers, PriceSuggestion};

use crate::pricing::handlers::parse_date;

/// The multipliers behind a suggestion
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MultipliersResponse {
    /// Weekend vs weekday check-in multiplier
    pub demand: String,

    /// Month-of-year seasonality multiplier
    pub seasonal: String,

    /// Lead time multiplier
    pub lead_time: String,

    /// Length of stay multiplier
    pub length_of_stay: String,
}

impl From<Multipliers> for MultipliersResponse {
    fn from(multipliers: Multipliers) -> Self {
        Self {
            demand: multipliers.demand.to_string(),
            seasonal: multipliers.seasonal.to_string(),
            lead_time: multipliers.lead_time.to_string(),
            length_of_stay: multipliers.length_of_stay.to_string(),
        }
    }
}

/// Suggested Price Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SuggestPriceResponse {
    /// Suggested nightly price in minor units
    pub suggested: u64,

    /// Lower bound of the suggested range
    pub min: u64,

    /// Upper bound of the suggested range
    pub max: u64,

    /// Confidence score between 0.7 and 1.0
    pub confidence: f64,

    /// The multipliers that produced the suggestion
    pub multipliers: MultipliersResponse,
}

impl From<PriceSuggestion> for SuggestPriceResponse {
    fn from(suggestion: PriceSuggestion) -> Self {
        Self {
            suggested: suggestion.suggested,
            min: suggestion.min,
            max: suggestion.max,
            confidence: suggestion.confidence,
            multipliers: suggestion.multipliers.into(),
        }
    }
}

/// Suggest Price Handler
///
/// Suggests a nightly rate for a stay from calendar-relative signals.
#[endpoint(tags("pricing"), summary = "Suggest Nightly Price")]
pub(crate) async fn handler(
    base_price: QueryParam<u64, true>,
    check_in: QueryParam<String, true>,
    check_out: QueryParam<String, true>,
) -> Result<Json<SuggestPriceResponse>, StatusError> {
    let check_in = parse_date(&check_in.into_inner(), "check_in")?;
    let check_out = parse_date(&check_out.into_inner(), "check_out")?;

    if check_out <= check_in {
        return Err(StatusError::bad_request().brief("check_out must be after check_in"));
    }

    let today = Zoned::now().date();

    let suggestion = advisor::suggest_price(base_price.into_inner(), check_in, check_out, today);

    Ok(Json(suggestion.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use super::*;

    fn make_service() -> Service {
        Service::new(Router::with_path("pricing/suggest").get(handler))
    }

    #[tokio::test]
    async fn test_suggest_returns_200_with_consistent_range() -> TestResult {
        let mut res = TestClient::get(
            "http://example.com/pricing/suggest?base_price=1000000&check_in=2030-07-19&check_out=2030-07-24",
        )
        .send(&make_service())
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: SuggestPriceResponse = res.take_json().await?;

        assert!(body.suggested > 0, "suggestion should be non-zero");
        assert!(body.min <= body.suggested, "range lower bound above suggestion");
        assert!(body.max >= body.suggested, "range upper bound below suggestion");
        assert!(
            (0.7..=1.0).contains(&body.confidence),
            "confidence out of range"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_suggest_with_unparseable_date_returns_400() -> TestResult {
        let res = TestClient::get(
            "http://example.com/pricing/suggest?base_price=1000000&check_in=not-a-date&check_out=2030-07-24",
        )
        .send(&make_service())
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_suggest_with_inverted_dates_returns_400() -> TestResult {
        let res = TestClient::get(
            "http://example.com/pricing/suggest?base_price=1000000&check_in=2030-07-24&check_out=2030-07-19",
        )
        .send(&make_service())
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
