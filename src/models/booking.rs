use chrono::NaiveDate;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::models::pricing::ChargeBreakdown;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Hotel,
    Attraction,
}

/// The fixed set of payment options the checkout accepts. The wizard
/// always holds a value, so advancing past payment selection is
/// unconditional.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Qris,
    Gopay,
    Transfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Qris
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BookingDetails {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub product_kind: ProductKind,
    pub product_id: ObjectId,
    /// Checkout session id, kept so a retried submission of the same
    /// attempt is detected instead of inserted twice.
    pub session_id: String,
    pub guest: GuestInfo,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub visit_date: Option<NaiveDate>,
    pub rooms: Option<i64>,
    pub tickets: Option<i64>,
    pub payment_method: PaymentMethod,
    pub voucher_id: Option<ObjectId>,
    pub charge: ChargeBreakdown,
    pub points_earned: i64,
    pub status: String,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}
