use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Client,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::hotel::Hotel;
use crate::services::pricing_service::{PricingService, HOTEL_TAX_BASIS_POINTS};

pub async fn get_hotels(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Hotel> = client.database("Catalog").collection("Hotels");

    match collection.find(doc! {}).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Hotel>>().await {
            Ok(hotels) => HttpResponse::Ok().json(hotels),
            Err(err) => {
                eprintln!("Failed to collect documents: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect hotels.")
            }
        },
        Err(err) => {
            eprintln!("Failed to find documents: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find hotels.")
        }
    }
}

pub async fn get_hotel_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Hotel> = client.database("Catalog").collection("Hotels");

    let hotel_id = match ObjectId::parse_str(path.into_inner().0) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid hotel ID format"),
    };

    match collection.find_one(doc! { "_id": hotel_id }).await {
        Ok(Some(hotel)) => HttpResponse::Ok().json(hotel),
        Ok(None) => HttpResponse::NotFound().body("Hotel not found"),
        Err(err) => {
            eprintln!("Error fetching hotel: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch hotel")
        }
    }
}

#[derive(Deserialize)]
pub struct HotelQuoteQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: i64,
}

/// Price a stay as of right now. Display surfaces and the checkout both
/// go through this same calculator, so the flash-sale price a guest sees
/// is the price the booking freezes.
pub async fn get_hotel_quote(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String,)>,
    query: web::Query<HotelQuoteQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Hotel> = client.database("Catalog").collection("Hotels");

    let hotel_id = match ObjectId::parse_str(path.into_inner().0) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid hotel ID format"),
    };

    let hotel = match collection.find_one(doc! { "_id": hotel_id }).await {
        Ok(Some(hotel)) => hotel,
        Ok(None) => return HttpResponse::NotFound().body("Hotel not found"),
        Err(err) => {
            eprintln!("Error fetching hotel: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch hotel");
        }
    };

    let nights = (query.check_out - query.check_in).num_days();
    if nights < 1 {
        return HttpResponse::BadRequest().body("check_out must be after check_in");
    }

    let quote = PricingService::rate_quote(
        hotel.nightly_rate,
        hotel.flash_sale.as_ref(),
        nights * query.rooms,
        HOTEL_TAX_BASIS_POINTS,
    );

    match PricingService::charge_breakdown(&quote, None) {
        Ok(charge) => HttpResponse::Ok().json(serde_json::json!({
            "quote": quote,
            "charge": charge,
        })),
        Err(err) => HttpResponse::BadRequest().body(err.to_string()),
    }
}
