//! Compare Price Handler

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use stayrate::advisor::{self, PriceComparison, PricePosition};

/// Compare Price Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ComparePriceRequest {
    /// The nightly price to classify, in minor units
    pub price: u64,

    /// Nightly prices of comparable listings, in minor units
    pub comparables: Vec<u64>,
}

/// Compare Price Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ComparePriceResponse {
    /// Position against the comparables: `low`, `competitive` or `high`
    pub position: String,

    /// Percentile rank of the price, 0-100
    pub percentile: f64,

    /// Human-readable recommendation
    pub recommendation: String,
}

impl From<PriceComparison> for ComparePriceResponse {
    fn from(comparison: PriceComparison) -> Self {
        let position = match comparison.position {
            PricePosition::Low => "low",
            PricePosition::Competitive => "competitive",
            PricePosition::High => "high",
        };

        Self {
            position: position.to_string(),
            percentile: comparison.percentile,
            recommendation: comparison.recommendation,
        }
    }
}

/// Compare Price Handler
///
/// Classifies a nightly price against comparable listings.
#[endpoint(tags("pricing"), summary = "Compare Price Against Comparables")]
pub(crate) async fn handler(
    json: JsonBody<ComparePriceRequest>,
) -> Json<ComparePriceResponse> {
    let request = json.into_inner();

    let comparison = advisor::compare_price(request.price, &request.comparables);

    Json(comparison.into())
}
