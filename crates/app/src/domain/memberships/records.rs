//! Membership Records

use stayrate::membership::{LoyaltyTier, MembershipSnapshot};

/// A guest's membership snapshot and loyalty tier, loaded read-only at
/// pricing time. The engine never writes these back.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipRecord {
    /// Paid membership snapshot, when the user has one.
    pub snapshot: Option<MembershipSnapshot>,

    /// Loyalty tier fallback.
    pub tier: Option<LoyaltyTier>,
}
