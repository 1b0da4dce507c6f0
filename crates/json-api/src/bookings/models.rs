//! Booking response models.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stayrate::adjustments::Adjustment;
use stayrate_app::domain::bookings::records::BookingRecord;

/// Booking Price Breakdown Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BookingResponse {
    /// The unique identifier of the booking
    pub uuid: Uuid,

    /// The listing being booked
    pub listing: Uuid,

    /// The property type of the listing
    pub property_type: String,

    /// Accommodation price for the whole stay, in minor units
    pub base_price: u64,

    /// Number of nights in the stay
    pub nights: u32,

    /// Additional services subtotal in minor units
    pub services_total: u64,

    /// Cleaning fee in minor units
    pub cleaning_fee: u64,

    /// Platform fee in minor units
    pub platform_fee: u64,

    /// Sum of all discounts in minor units
    pub discount_total: u64,

    /// Total price after discounts in minor units
    pub total_price: u64,

    /// The discount adjustments applied to the booking
    pub adjustments: Vec<AdjustmentResponse>,

    /// The date and time the booking was created
    pub created_at: String,

    /// The date and time the booking was last updated
    pub updated_at: String,
}

impl From<BookingRecord> for BookingResponse {
    fn from(booking: BookingRecord) -> Self {
        Self {
            uuid: booking.uuid.into_uuid(),
            listing: booking.listing,
            property_type: booking.property_type,
            base_price: booking.base_price,
            nights: booking.nights,
            services_total: booking.services_total,
            cleaning_fee: booking.cleaning_fee,
            platform_fee: booking.platform_fee,
            discount_total: booking.discount_total,
            total_price: booking.total_price,
            adjustments: booking.adjustments.iter().map(AdjustmentResponse::from).collect(),
            created_at: booking.created_at.to_string(),
            updated_at: booking.updated_at.to_string(),
        }
    }
}

/// Adjustment Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AdjustmentResponse {
    /// Adjustment kind: `membership` or `promotion`
    pub kind: String,

    /// Display label: plan or tier name, or the promotion name
    pub label: String,

    /// Promotion code; absent on membership entries
    pub code: Option<String>,

    /// Discount amount in minor units
    pub amount: u64,

    /// Percentage rate, when the discount is rate-based
    pub rate: Option<String>,
}

impl From<&Adjustment> for AdjustmentResponse {
    fn from(adjustment: &Adjustment) -> Self {
        match adjustment {
            Adjustment::Membership {
                label,
                rate,
                amount,
                ..
            } => Self {
                kind: "membership".to_string(),
                label: label.clone(),
                code: None,
                amount: *amount,
                rate: Some(rate.to_string()),
            },
            Adjustment::Promotion {
                code,
                name,
                amount,
                rate,
                ..
            } => Self {
                kind: "promotion".to_string(),
                label: name.clone(),
                code: Some(code.clone()),
                amount: *amount,
                rate: rate.as_ref().map(ToString::to_string),
            },
        }
    }
}
