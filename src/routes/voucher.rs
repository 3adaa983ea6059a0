use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use mongodb::{bson::doc, Client};
use std::sync::Arc;

use crate::models::voucher::VoucherCatalogEntry;

/// The public loyalty catalog. Sold-out entries stay visible; claiming
/// them is what gets refused.
pub async fn get_voucher_catalog(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<VoucherCatalogEntry> =
        client.database("Catalog").collection("VoucherCatalog");

    match collection.find(doc! {}).await {
        Ok(cursor) => match cursor.try_collect::<Vec<VoucherCatalogEntry>>().await {
            Ok(entries) => HttpResponse::Ok().json(entries),
            Err(err) => {
                eprintln!("Failed to collect documents: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect vouchers.")
            }
        },
        Err(err) => {
            eprintln!("Failed to find documents: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find vouchers.")
        }
    }
}
