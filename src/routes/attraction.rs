use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Client,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::attraction::Attraction;
use crate::services::pricing_service::{PricingService, ATTRACTION_TAX_BASIS_POINTS};

pub async fn get_attractions(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Attraction> =
        client.database("Catalog").collection("Attractions");

    match collection.find(doc! {}).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Attraction>>().await {
            Ok(attractions) => HttpResponse::Ok().json(attractions),
            Err(err) => {
                eprintln!("Failed to collect documents: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect attractions.")
            }
        },
        Err(err) => {
            eprintln!("Failed to find documents: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find attractions.")
        }
    }
}

pub async fn get_attraction_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Attraction> =
        client.database("Catalog").collection("Attractions");

    let attraction_id = match ObjectId::parse_str(path.into_inner().0) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid attraction ID format"),
    };

    match collection.find_one(doc! { "_id": attraction_id }).await {
        Ok(Some(attraction)) => HttpResponse::Ok().json(attraction),
        Ok(None) => HttpResponse::NotFound().body("Attraction not found"),
        Err(err) => {
            eprintln!("Error fetching attraction: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch attraction")
        }
    }
}

#[derive(Deserialize)]
pub struct AttractionQuoteQuery {
    pub tickets: i64,
}

pub async fn get_attraction_quote(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String,)>,
    query: web::Query<AttractionQuoteQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Attraction> =
        client.database("Catalog").collection("Attractions");

    let attraction_id = match ObjectId::parse_str(path.into_inner().0) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid attraction ID format"),
    };

    let attraction = match collection.find_one(doc! { "_id": attraction_id }).await {
        Ok(Some(attraction)) => attraction,
        Ok(None) => return HttpResponse::NotFound().body("Attraction not found"),
        Err(err) => {
            eprintln!("Error fetching attraction: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch attraction");
        }
    };

    let quote = PricingService::rate_quote(
        attraction.ticket_price,
        attraction.flash_sale.as_ref(),
        query.tickets,
        ATTRACTION_TAX_BASIS_POINTS,
    );

    match PricingService::charge_breakdown(&quote, None) {
        Ok(charge) => HttpResponse::Ok().json(serde_json::json!({
            "quote": quote,
            "charge": charge,
        })),
        Err(err) => HttpResponse::BadRequest().body(err.to_string()),
    }
}
