use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::models::hotel::Address;
use crate::models::pricing::FlashSale;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpeningHours {
    pub open: String,
    pub close: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Attraction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub address: Address,
    pub categories: Vec<String>,
    /// Price per ticket, in whole rupiah. Attraction tickets are tax exempt.
    pub ticket_price: i64,
    pub opening_hours: OpeningHours,
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash_sale: Option<FlashSale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}
