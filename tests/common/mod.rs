use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use wisata_api::db::mongo::create_mongo_client;
use wisata_api::services::pricing_service::{
    PricingService, ATTRACTION_TAX_BASIS_POINTS, HOTEL_TAX_BASIS_POINTS,
};

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mongo_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = create_mongo_client(&mongo_uri).await;

        Self { client }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .route("/", web::get().to(|| async { "Wisata API is running" }))
            .route("/health", web::get().to(health_check))
            .route("/hotels", web::get().to(get_hotels))
            .route("/hotels/{id}", web::get().to(get_hotel_by_id))
            .route("/hotels/{id}/quote", web::get().to(get_hotel_quote))
            .route("/attractions", web::get().to(get_attractions))
            .route("/attractions/{id}", web::get().to(get_attraction_by_id))
            .route("/attractions/{id}/quote", web::get().to(get_attraction_quote))
            .route("/vouchers", web::get().to(get_voucher_catalog))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(signup))
                    .route("/signin", web::post().to(signin))
                    .route("/session", web::get().to(unauthorized_handler)),
            )
            .service(
                web::scope("/account/{id}")
                    .route("/loyalty", web::get().to(unauthorized_handler))
                    .route("/vouchers", web::get().to(unauthorized_handler))
                    .route(
                        "/vouchers/{catalog_id}/claim",
                        web::post().to(unauthorized_handler),
                    )
                    .route("/bookings", web::get().to(unauthorized_handler))
                    .route("/bookings/{booking_id}", web::get().to(unauthorized_handler)),
            )
            .service(
                web::scope("/checkout")
                    .route("/start", web::post().to(unauthorized_handler))
                    .route("/{session_id}", web::get().to(unauthorized_handler))
                    .route("/{session_id}/guest-details", web::put().to(unauthorized_handler))
                    .route(
                        "/{session_id}/payment-method",
                        web::put().to(unauthorized_handler),
                    )
                    .route("/{session_id}/voucher", web::put().to(unauthorized_handler))
                    .route("/{session_id}/next", web::post().to(unauthorized_handler))
                    .route("/{session_id}/back", web::post().to(unauthorized_handler))
                    .route("/{session_id}/submit", web::post().to(unauthorized_handler))
                    .route("/{session_id}", web::delete().to(unauthorized_handler)),
            )
    }
}

// Mock handler functions for testing
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "OK"}))
}

async fn get_hotels() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!([]))
}

async fn get_attractions() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!([]))
}

async fn get_voucher_catalog() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!([]))
}

async fn get_hotel_by_id() -> impl Responder {
    HttpResponse::NotFound().json(serde_json::json!({"error": "Hotel not found"}))
}

async fn get_attraction_by_id() -> impl Responder {
    HttpResponse::NotFound().json(serde_json::json!({"error": "Attraction not found"}))
}

#[derive(Deserialize)]
struct HotelQuoteParams {
    check_in: NaiveDate,
    check_out: NaiveDate,
    rooms: i64,
}

// Quote mocks skip the database but price through the real calculator,
// so the figures the suite asserts on are the production figures.
const TEST_NIGHTLY_RATE: i64 = 1_000_000;
const TEST_TICKET_PRICE: i64 = 150_000;

async fn get_hotel_quote(query: web::Query<HotelQuoteParams>) -> impl Responder {
    let nights = (query.check_out - query.check_in).num_days();
    if nights < 1 {
        return HttpResponse::BadRequest().body("check_out must be after check_in");
    }

    let quote = PricingService::rate_quote(
        TEST_NIGHTLY_RATE,
        None,
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

#[derive(Deserialize)]
struct AttractionQuoteParams {
    tickets: i64,
}

async fn get_attraction_quote(query: web::Query<AttractionQuoteParams>) -> impl Responder {
    let quote = PricingService::rate_quote(
        TEST_TICKET_PRICE,
        None,
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

async fn signup() -> impl Responder {
    HttpResponse::BadRequest().json(serde_json::json!({"error": "Invalid input"}))
}

async fn signin() -> impl Responder {
    HttpResponse::Unauthorized().json(serde_json::json!({"error": "Invalid credentials"}))
}

async fn unauthorized_handler() -> impl Responder {
    HttpResponse::Unauthorized().json(serde_json::json!({"error": "Unauthorized"}))
}

pub fn get_test_user_id() -> String {
    mongodb::bson::oid::ObjectId::new().to_hex()
}

pub async fn cleanup_test_data(client: &mongodb::Client) {
    let db = client.database("Account");

    let collections = ["Users", "Bookings", "LoyaltyBalances", "UserVouchers"];
    for collection_name in collections {
        let collection = db.collection::<mongodb::bson::Document>(collection_name);
        let _ = collection
            .delete_many(mongodb::bson::doc! {
                "$or": [
                    {"email": {"$regex": "test.*@example.com"}},
                    {"guest.email": {"$regex": "test.*@example.com"}},
                ]
            })
            .await;
    }
}
