//! Dynamic price advisor
//!
//! Suggests a nightly rate from calendar-relative signals: day-of-week
//! demand, a fixed seasonal table, lead time, and length of stay. The four
//! multipliers are independent and combine by multiplication. Stateless; the
//! booking flow calls it before a booking exists and it never touches the
//! redemption ledger.

use jiff::{
    ToSpan,
    civil::{Date, Weekday},
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// The four independent multipliers behind a suggestion, kept for audit and
/// UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multipliers {
    /// Weekend vs weekday check-in.
    pub demand: Decimal,

    /// Month-of-year seasonality.
    pub seasonal: Decimal,

    /// Days between today and check-in.
    pub lead_time: Decimal,

    /// Nights in the stay.
    pub length_of_stay: Decimal,
}

impl Multipliers {
    /// The combined multiplier.
    #[must_use]
    pub fn combined(&self) -> Decimal {
        self.demand * self.seasonal * self.lead_time * self.length_of_stay
    }
}

/// A suggested nightly price with its range and confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    /// Suggested nightly price in minor units.
    pub suggested: u64,

    /// Lower bound of the range (suggested − 15%).
    pub min: u64,

    /// Upper bound of the range (suggested + 15%).
    pub max: u64,

    /// Confidence score in `[0.7, 1.0]`.
    pub confidence: f64,

    /// The multipliers that produced the suggestion.
    pub multipliers: Multipliers,
}

/// One entry of a day-by-day rate forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRate {
    /// The night being priced.
    pub date: Date,

    /// Suggested rate for a one-night stay checking in on `date`.
    pub suggested: u64,
}

/// Where a price sits against comparable listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    /// Below the 25th percentile.
    Low,

    /// Between the 25th and 75th percentiles.
    Competitive,

    /// Above the 75th percentile.
    High,
}

/// A price classified against comparables, with a qualitative
/// recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    /// Position against the comparable set.
    pub position: PricePosition,

    /// Percentile rank of the price, 0–100.
    pub percentile: f64,

    /// Human-readable recommendation.
    pub recommendation: String,
}

/// Suggest a nightly price for a stay.
///
/// `suggested = round(base × demand × seasonal × lead_time × length_of_stay)`,
/// with a ±15% range around it. Confidence starts at 0.7, gains 0.2 for
/// near-term check-ins (< 30 days; 0.1 under 60), gains 0.1 for stays of 2–7
/// nights, and caps at 1.0.
#[must_use]
pub fn suggest_price(base_price: u64, check_in: Date, check_out: Date, today: Date) -> PriceSuggestion {
    let lead_days = (check_in - today).get_days();
    let nights = (check_out - check_in).get_days().max(0);

    let multipliers = Multipliers {
        demand: demand_multiplier(check_in),
        seasonal: seasonal_multiplier(check_in.month()),
        lead_time: lead_time_multiplier(lead_days),
        length_of_stay: length_of_stay_multiplier(nights),
    };

    let suggested = round_to_minor(Decimal::from(base_price) * multipliers.combined());

    PriceSuggestion {
        suggested,
        min: round_to_minor(Decimal::from(suggested) * Decimal::new(85, 2)),
        max: round_to_minor(Decimal::from(suggested) * Decimal::new(115, 2)),
        confidence: confidence(lead_days, nights),
        multipliers,
    }
}

/// Produce a day-by-day forecast of one-night rates over a horizon, starting
/// today.
#[must_use]
pub fn forecast(base_price: u64, today: Date, horizon_days: u16) -> Vec<DailyRate> {
    today
        .series(1.day())
        .take(usize::from(horizon_days))
        .map(|date| {
            let check_out = date.saturating_add(1.day());

            DailyRate {
                date,
                suggested: suggest_price(base_price, date, check_out, today).suggested,
            }
        })
        .collect()
}

/// Classify a listing's price against a set of comparable prices.
///
/// Below the 25th percentile is low, above the 75th is high, everything else
/// is competitive. An empty comparable set is reported as competitive with a
/// caveat.
#[must_use]
pub fn compare_price(price: u64, comparables: &[u64]) -> PriceComparison {
    if comparables.is_empty() {
        return PriceComparison {
            position: PricePosition::Competitive,
            percentile: 50.0,
            recommendation: "Not enough comparable listings to position this price.".to_string(),
        };
    }

    let below = comparables.iter().filter(|&&c| c < price).count();
    let equal = comparables.iter().filter(|&&c| c == price).count();

    // Midpoint rank so a price equal to every comparable lands at the 50th.
    #[expect(clippy::cast_precision_loss, reason = "comparable sets are small")]
    let percentile =
        (below as f64 + equal as f64 / 2.0) / comparables.len() as f64 * 100.0;

    let (position, recommendation) = if percentile < 25.0 {
        (
            PricePosition::Low,
            "Priced below most comparable listings; there may be room to raise the rate.",
        )
    } else if percentile > 75.0 {
        (
            PricePosition::High,
            "Priced above most comparable listings; consider lowering the rate to stay competitive.",
        )
    } else {
        (
            PricePosition::Competitive,
            "Priced in line with comparable listings.",
        )
    };

    PriceComparison {
        position,
        percentile,
        recommendation: recommendation.to_string(),
    }
}

fn demand_multiplier(check_in: Date) -> Decimal {
    match check_in.weekday() {
        Weekday::Friday | Weekday::Saturday | Weekday::Sunday => Decimal::new(115, 2),
        _ => Decimal::new(95, 2),
    }
}

fn seasonal_multiplier(month: i8) -> Decimal {
    match month {
        2 => Decimal::new(85, 2),
        6 | 8 => Decimal::new(115, 2),
        7 | 12 => Decimal::new(120, 2),
        5 => Decimal::new(105, 2),
        1 | 3 | 10 => Decimal::new(95, 2),
        _ => Decimal::ONE,
    }
}

fn lead_time_multiplier(lead_days: i32) -> Decimal {
    if lead_days < 7 {
        Decimal::new(110, 2)
    } else if lead_days <= 30 {
        Decimal::ONE
    } else if lead_days <= 60 {
        Decimal::new(95, 2)
    } else {
        Decimal::new(90, 2)
    }
}

fn length_of_stay_multiplier(nights: i32) -> Decimal {
    if nights >= 30 {
        Decimal::new(80, 2)
    } else if nights >= 7 {
        Decimal::new(90, 2)
    } else {
        Decimal::ONE
    }
}

fn confidence(lead_days: i32, nights: i32) -> f64 {
    let mut score: f64 = 0.7;

    if lead_days < 30 {
        score += 0.2;
    } else if lead_days < 60 {
        score += 0.1;
    }

    if (2..=7).contains(&nights) {
        score += 0.1;
    }

    score.min(1.0)
}

fn round_to_minor(value: Decimal) -> u64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0)
}
