//! Membership discounts
//!
//! Resolves a membership or loyalty discount from a read-mostly snapshot
//! attached to the guest at booking time. An active paid plan wins over the
//! loyalty tier fallback; the tier table is fixed. The engine never mutates
//! the snapshot.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::percent_of_minor;

/// Lifecycle status of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Paid up and active.
    Active,

    /// Payment lapsed; benefits suspended.
    PastDue,

    /// Cancelled by the user or the platform.
    Cancelled,
}

/// A paid membership plan descriptor, snapshotted at booking time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSnapshot {
    /// Display name, e.g. "Stayrate Plus".
    pub name: String,

    /// URL-safe identifier.
    pub slug: String,

    /// Percentage discount the plan grants.
    pub rate: Decimal,

    /// Whether the rate also applies to add-on services.
    pub includes_services: bool,
}

/// A guest's membership state at the time of pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipSnapshot {
    /// Current lifecycle status.
    pub status: MembershipStatus,

    /// Expiry of the current period, if the plan expires.
    pub expires_at: Option<Timestamp>,

    /// The paid plan, when one is attached.
    pub plan: Option<PlanSnapshot>,
}

impl MembershipSnapshot {
    /// Whether the membership currently grants benefits.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.status == MembershipStatus::Active
            && self.expires_at.is_none_or(|expires| expires >= now)
    }
}

/// Loyalty tiers used as a fallback when no paid plan is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    /// Entry tier; no discount.
    Bronze,

    /// 3% off accommodation.
    Silver,

    /// 5% off accommodation.
    Gold,

    /// 8% off accommodation and add-on services.
    Platinum,
}

impl LoyaltyTier {
    /// Percentage discount the tier grants.
    #[must_use]
    pub fn rate(self) -> Decimal {
        match self {
            Self::Bronze => Decimal::ZERO,
            Self::Silver => Decimal::from(3u32),
            Self::Gold => Decimal::from(5u32),
            Self::Platinum => Decimal::from(8u32),
        }
    }

    /// Whether the tier discount extends to add-on services.
    #[must_use]
    pub fn includes_services(self) -> bool {
        matches!(self, Self::Platinum)
    }

    /// Display label embedded in the booking's adjustment list.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze loyalty",
            Self::Silver => "Silver loyalty",
            Self::Gold => "Gold loyalty",
            Self::Platinum => "Platinum loyalty",
        }
    }

    /// Stable slug used in storage and scoping sets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }

    /// Parse a stored slug back into a tier.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "platinum" => Some(Self::Platinum),
            _ => None,
        }
    }
}

/// A resolved membership discount, ready for the price compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipDiscount {
    /// Discount amount in minor units.
    pub amount: u64,

    /// Percentage rate that was applied.
    pub rate: Decimal,

    /// Whether add-on services were included in the discountable base.
    pub includes_services: bool,

    /// Display label of the plan or tier the discount came from.
    pub label: String,
}

/// Compute the membership discount for a booking, if any.
///
/// An active paid plan takes precedence; otherwise the loyalty tier table is
/// consulted. A zero rate yields no discount. The discount never exceeds its
/// own discountable base.
#[must_use]
pub fn membership_discount(
    membership: Option<&MembershipSnapshot>,
    tier: Option<LoyaltyTier>,
    accommodation_subtotal: u64,
    services_subtotal: u64,
    now: Timestamp,
) -> Option<MembershipDiscount> {
    let (rate, includes_services, label) = match membership {
        Some(snapshot) if snapshot.is_active(now) => match &snapshot.plan {
            Some(plan) => (plan.rate, plan.includes_services, plan.name.clone()),
            None => tier_entry(tier)?,
        },
        _ => tier_entry(tier)?,
    };

    if rate <= Decimal::ZERO {
        return None;
    }

    let discountable = if includes_services {
        accommodation_subtotal.saturating_add(services_subtotal)
    } else {
        accommodation_subtotal
    };

    let amount = percent_of_minor(discountable, rate).min(discountable);

    Some(MembershipDiscount {
        amount,
        rate,
        includes_services,
        label,
    })
}

fn tier_entry(tier: Option<LoyaltyTier>) -> Option<(Decimal, bool, String)> {
    let tier = tier?;

    Some((tier.rate(), tier.includes_services(), tier.label().to_string()))
}
