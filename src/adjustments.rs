//! Booking price adjustments
//!
//! A booking carries at most one membership adjustment and at most one
//! promotion adjustment. The list is rebuilt from scratch on every
//! recomposition rather than mutated in place, so the entries always agree
//! with the booking's discount totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::promotions::DiscountKind;

/// A single entry in a booking's adjustment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Adjustment {
    /// Discount granted by an active membership plan or loyalty tier.
    Membership {
        /// Display label of the plan or tier the discount came from.
        label: String,

        /// Percentage rate that was applied.
        rate: Decimal,

        /// Discount amount in minor units.
        amount: u64,

        /// Whether add-on services were included in the discountable base.
        includes_services: bool,
    },

    /// Discount granted by a redeemed promotion code.
    Promotion {
        /// Normalized promotion code.
        code: String,

        /// Promotion display name.
        name: String,

        /// Discount amount in minor units, after all clamping.
        amount: u64,

        /// Percentage or fixed-amount discount.
        kind: DiscountKind,

        /// Percentage rate, present only for percentage promotions.
        rate: Option<Decimal>,

        /// Whether this promotion may coexist with a membership discount.
        stacks_with_membership: bool,

        /// Whether this promotion may coexist with other promotions.
        stacks_with_promotions: bool,
    },
}

impl Adjustment {
    /// Discount amount carried by this entry, in minor units.
    #[must_use]
    pub fn amount(&self) -> u64 {
        match self {
            Self::Membership { amount, .. } | Self::Promotion { amount, .. } => *amount,
        }
    }

    /// The promotion code, when this is a promotion entry.
    #[must_use]
    pub fn promotion_code(&self) -> Option<&str> {
        match self {
            Self::Promotion { code, .. } => Some(code),
            Self::Membership { .. } => None,
        }
    }
}
