use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Time-boxed percent discount attached to a hotel or attraction.
/// The percent only reaches a `RateQuote` while the window is open.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlashSale {
    pub discount_percent: i64,
    pub starts_at: DateTime,
    pub ends_at: DateTime,
}

impl FlashSale {
    pub fn is_active_at(&self, now: DateTime) -> bool {
        self.starts_at.timestamp_millis() <= now.timestamp_millis()
            && now.timestamp_millis() < self.ends_at.timestamp_millis()
    }
}

/// A priceable offer at a point in time. All amounts are i64 minor units
/// (whole rupiah); tax is carried in basis points of 1/10_000.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateQuote {
    pub base_unit_price: i64,
    pub discount_percent: Option<i64>,
    pub quantity: i64,
    pub tax_basis_points: i64,
}

/// The frozen output of a checkout: what the guest actually pays.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChargeBreakdown {
    pub subtotal: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
}
