use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// An offer in the loyalty catalog. `remaining` is the stock still
/// claimable; it is decremented with a guarded update, never read-then-write.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoucherCatalogEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    /// Flat discount in whole rupiah, applied once per booking.
    pub discount_amount: i64,
    /// Points debited from the balance when a user claims this entry.
    pub points_cost: i64,
    pub remaining: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// A user-owned copy created by a successful claim. Consumed at most once:
/// `is_used` flips false -> true through a conditional update during booking
/// submission and never flips back except on a failed submission rollback.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserVoucher {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub catalog_id: ObjectId,
    pub code: String,
    pub discount_amount: i64,
    pub points_cost: i64,
    pub is_used: bool,
    pub claimed_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime>,
}
