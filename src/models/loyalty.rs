use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Per-user cumulative point balance. Created with 0 points at signup,
/// incremented on confirmed bookings, decremented only by voucher claims.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoyaltyBalance {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Membership tier. Derived from the point balance on every read,
/// never stored on its own.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
}

impl std::fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoyaltyTier::Bronze => write!(f, "Bronze"),
            LoyaltyTier::Silver => write!(f, "Silver"),
            LoyaltyTier::Gold => write!(f, "Gold"),
        }
    }
}

/// What the account loyalty endpoint returns: the balance resolved
/// against the tier table.
#[derive(Debug, Serialize, Deserialize)]
pub struct TierStatus {
    pub points: i64,
    pub tier: LoyaltyTier,
    pub next_tier: Option<LoyaltyTier>,
    pub progress_percent: i64,
}
