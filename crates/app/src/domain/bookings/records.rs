//! Booking Records

use jiff::Timestamp;
use uuid::Uuid;

use stayrate::{
    adjustments::Adjustment,
    membership::MembershipDiscount,
    pricing::{BookingTotals, Composition},
};

use crate::uuids::TypedUuid;

/// Booking UUID
pub type BookingUuid = TypedUuid<BookingRecord>;

/// A reservation as the pricing engine sees it. Amounts are minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub uuid: BookingUuid,

    /// Owning guest; `None` for walk-in bookings.
    pub guest: Option<Uuid>,

    /// Owning host.
    pub host: Uuid,

    /// Listing the booking is for.
    pub listing: Uuid,

    /// Property-type classification of the listing.
    pub property_type: String,

    /// Accommodation price for the whole stay.
    pub base_price: u64,

    /// Number of nights.
    pub nights: u32,

    /// Add-on services subtotal.
    pub services_total: u64,

    /// Cleaning fee.
    pub cleaning_fee: u64,

    /// Platform fee.
    pub platform_fee: u64,

    /// Cumulative discount currently applied.
    pub discount_total: u64,

    /// Final payable total.
    pub total_price: u64,

    /// Applied adjustment entries, rebuilt on every recomposition.
    pub adjustments: Vec<Adjustment>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BookingRecord {
    /// The persisted figures the price compositor starts from.
    #[must_use]
    pub fn totals(&self) -> BookingTotals {
        BookingTotals {
            total: self.total_price,
            discount: self.discount_total,
        }
    }

    /// The promotion code currently applied, if any.
    #[must_use]
    pub fn applied_promotion_code(&self) -> Option<&str> {
        self.adjustments
            .iter()
            .find_map(Adjustment::promotion_code)
    }

    /// The membership discount currently on the booking, reconstructed from
    /// its adjustment entry so a removal restores totals exactly.
    #[must_use]
    pub fn membership_discount(&self) -> Option<MembershipDiscount> {
        self.adjustments.iter().find_map(|adjustment| match adjustment {
            Adjustment::Membership {
                label,
                rate,
                amount,
                includes_services,
            } => Some(MembershipDiscount {
                amount: *amount,
                rate: *rate,
                includes_services: *includes_services,
                label: label.clone(),
            }),
            Adjustment::Promotion { .. } => None,
        })
    }

    /// Fold a fresh composition back into the record.
    pub fn apply_composition(&mut self, composition: &Composition) {
        self.discount_total = composition.total_discount;
        self.total_price = composition.total;
        self.adjustments = composition.adjustments.to_vec();
    }
}
