//! Promotions
//!
//! The promotion model and the discount rule resolver. A [`Promotion`] is a
//! declarative discount rule; [`eligibility::resolve_discount`] decides
//! whether a code applies to a booking and, if so, how much it is worth.
//! Nothing here performs I/O; usage counters are read as plain fields and
//! mutated only by the redemption ledger in `stayrate-app`.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::membership::LoyaltyTier;

pub mod eligibility;

/// Kind of discount a promotion grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage off the discountable subtotal.
    Percentage,

    /// Fixed amount off, in minor units.
    FixedAmount,
}

/// Discount configuration for a promotion.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleDiscount {
    /// Percentage off the booking subtotal, optionally capped.
    PercentageOff {
        /// Rate in percent, e.g. `10` for 10% off.
        rate: Decimal,

        /// Ceiling on the discount amount in minor units.
        max_discount: Option<u64>,
    },

    /// Fixed amount off the booking subtotal, in minor units.
    FixedAmountOff {
        /// Amount in minor units.
        amount: u64,
    },
}

impl SimpleDiscount {
    /// The discount kind this configuration represents.
    #[must_use]
    pub fn kind(&self) -> DiscountKind {
        match self {
            Self::PercentageOff { .. } => DiscountKind::Percentage,
            Self::FixedAmountOff { .. } => DiscountKind::FixedAmount,
        }
    }

    /// Percentage rate, when this is a percentage discount.
    #[must_use]
    pub fn rate(&self) -> Option<Decimal> {
        match self {
            Self::PercentageOff { rate, .. } => Some(*rate),
            Self::FixedAmountOff { .. } => None,
        }
    }
}

/// Audience and catalog scoping for a promotion. Empty sets mean unrestricted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionScope {
    /// Listings the promotion is limited to.
    pub listings: FxHashSet<Uuid>,

    /// Property-type classifications the promotion is limited to.
    pub property_types: FxHashSet<String>,

    /// Loyalty tiers the promotion is limited to.
    pub tiers: FxHashSet<LoyaltyTier>,

    /// User identities the promotion is limited to.
    pub users: FxHashSet<Uuid>,
}

impl PromotionScope {
    /// A scope with no restrictions at all.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }
}

/// A named, codified discount rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    /// Unique, uppercase code the guest enters.
    pub code: String,

    /// Display name, embedded in the booking's adjustment list.
    pub name: String,

    /// Discount configuration.
    pub discount: SimpleDiscount,

    /// Start of the validity window, inclusive.
    pub valid_from: Option<Timestamp>,

    /// End of the validity window, inclusive.
    pub valid_until: Option<Timestamp>,

    /// Minimum pre-discount booking value in minor units.
    pub min_booking_value: Option<u64>,

    /// Audience and catalog restrictions.
    pub scope: PromotionScope,

    /// Whether the discount may coexist with a membership discount.
    pub stacks_with_membership: bool,

    /// Whether the discount may coexist with other promotions.
    pub stacks_with_promotions: bool,

    /// Global redemption counter. Mutated only by the redemption ledger.
    pub use_count: u64,

    /// Global cap on `use_count`.
    pub max_uses: Option<u64>,

    /// Cap on concurrent redemptions per user.
    pub max_uses_per_user: Option<u32>,
}

/// The identity a request is made under.
///
/// Anonymous callers can price walk-in bookings but never create redemption
/// rows and never move a promotion's usage counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// No authenticated identity.
    Anonymous,

    /// An authenticated user.
    User(Uuid),
}

impl Caller {
    /// The user uuid, when authenticated.
    #[must_use]
    pub fn user(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::User(uuid) => Some(*uuid),
        }
    }
}

/// Everything the rule resolver needs to know about a booking.
#[derive(Debug, Clone)]
pub struct BookingContext {
    /// Listing the booking is for.
    pub listing: Uuid,

    /// Property-type classification of the listing.
    pub property_type: String,

    /// Identity the code is being redeemed under.
    pub caller: Caller,

    /// Caller's loyalty tier, if any.
    pub tier: Option<LoyaltyTier>,

    /// Booking total before any discounts, in minor units.
    pub total_before_discounts: u64,

    /// Membership discount currently applied to the booking, in minor units.
    pub membership_discount: u64,

    /// Promotion code currently applied to the booking, if any.
    pub applied_code: Option<String>,
}

/// A rule-checked promotion discount, ready for the price compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionDiscount {
    /// Normalized promotion code.
    pub code: String,

    /// Promotion display name.
    pub name: String,

    /// Discount amount in minor units, clamped to the discountable subtotal.
    pub amount: u64,

    /// Discount kind.
    pub kind: DiscountKind,

    /// Percentage rate, for percentage promotions.
    pub rate: Option<Decimal>,

    /// Whether the promotion stacks with membership discounts.
    pub stacks_with_membership: bool,

    /// Whether the promotion stacks with other promotions.
    pub stacks_with_promotions: bool,
}
