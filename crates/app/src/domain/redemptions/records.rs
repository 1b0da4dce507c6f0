//! Redemption Records

use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    domain::{bookings::records::BookingUuid, promotions::records::PromotionUuid},
    uuids::TypedUuid,
};

/// Redemption UUID
pub type RedemptionUuid = TypedUuid<RedemptionRecord>;

/// State of a user's hold on a promotion code.
///
/// `Active ⇄ Used` are the only states and apply/remove the only transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionStatus {
    /// Reserved but not currently applied to any booking.
    Active,

    /// Currently applied to a specific booking.
    Used,
}

impl RedemptionStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "used" => Some(Self::Used),
            _ => None,
        }
    }
}

/// One row per (promotion, user) pair; its status reflects exactly whether a
/// booking currently carries the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionRecord {
    pub uuid: RedemptionUuid,
    pub promotion: PromotionUuid,
    pub user: Uuid,
    pub status: RedemptionStatus,

    /// The booking the code is applied to, when `status` is `Used`.
    pub booking: Option<BookingUuid>,

    pub applied_at: Option<Timestamp>,
    pub removed_at: Option<Timestamp>,
}

impl RedemptionRecord {
    /// Whether this row is currently consumed by the given booking.
    #[must_use]
    pub fn is_used_by(&self, booking: BookingUuid) -> bool {
        self.status == RedemptionStatus::Used && self.booking == Some(booking)
    }
}
