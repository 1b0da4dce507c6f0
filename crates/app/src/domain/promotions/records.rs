//! Promotion Records

use jiff::Timestamp;

use stayrate::promotions::Promotion;

use crate::uuids::TypedUuid;

/// Promotion UUID
pub type PromotionUuid = TypedUuid<PromotionRecord>;

/// A stored promotion row with its rule model.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRecord {
    pub uuid: PromotionUuid,

    /// The declarative rule the resolver evaluates.
    pub promotion: Promotion,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A fresh read of a promotion's usage counter, taken under `FOR UPDATE`
/// inside the redemption transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionUsage {
    /// Current global redemption count.
    pub use_count: u64,

    /// Global cap, when the promotion is capped.
    pub max_uses: Option<u64>,
}

impl PromotionUsage {
    /// Whether one more redemption would exceed the cap.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.use_count >= max)
    }
}
