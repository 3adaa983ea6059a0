use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use wisata_api::db;
use wisata_api::middleware::auth::AuthMiddleware;
use wisata_api::routes;
use wisata_api::services::checkout_service::CheckoutSessionStore;
use wisata_api::services::loyalty::store::MongoLoyaltyStore;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    println!("MongoDB connection established");

    let loyalty_store = Arc::new(MongoLoyaltyStore::new(client.clone()));
    // Checkout sessions are shared across workers, so the store is built
    // once and handed to every App instance
    let checkout_sessions = web::Data::new(CheckoutSessionStore::new());

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/health", web::get().to(routes::health::health_check))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(loyalty_store.clone()))
            .app_data(checkout_sessions.clone())
            .service(
                web::scope("/api")
                    // Public routes
                    .service(
                        web::scope("/auth")
                            .route("/signup", web::post().to(routes::account::auth::signup))
                            .route("/signin", web::post().to(routes::account::auth::signin))
                            .service(
                                web::scope("").wrap(AuthMiddleware).route(
                                    "/session",
                                    web::get().to(routes::account::auth::user_session),
                                ),
                            ),
                    )
                    .service(
                        web::scope("/hotels")
                            .route("", web::get().to(routes::hotel::get_hotels))
                            .route("/{id}", web::get().to(routes::hotel::get_hotel_by_id))
                            .route("/{id}/quote", web::get().to(routes::hotel::get_hotel_quote)),
                    )
                    .service(
                        web::scope("/attractions")
                            .route("", web::get().to(routes::attraction::get_attractions))
                            .route(
                                "/{id}",
                                web::get().to(routes::attraction::get_attraction_by_id),
                            )
                            .route(
                                "/{id}/quote",
                                web::get().to(routes::attraction::get_attraction_quote),
                            ),
                    )
                    .route(
                        "/vouchers",
                        web::get().to(routes::voucher::get_voucher_catalog),
                    )
                    // Protected routes
                    .service(
                        web::scope("/account/{id}")
                            .wrap(AuthMiddleware)
                            .route(
                                "/loyalty",
                                web::get().to(routes::account::loyalty::get_loyalty_status),
                            )
                            .route(
                                "/vouchers",
                                web::get().to(routes::account::vouchers::get_my_vouchers),
                            )
                            .route(
                                "/vouchers/{catalog_id}/claim",
                                web::post().to(routes::account::vouchers::claim_voucher),
                            )
                            .route(
                                "/bookings",
                                web::get().to(routes::account::bookings::get_all_bookings),
                            )
                            .route(
                                "/bookings/{booking_id}",
                                web::get().to(routes::account::bookings::get_booking_by_id),
                            ),
                    )
                    .service(
                        web::scope("/checkout")
                            .wrap(AuthMiddleware)
                            .route("/start", web::post().to(routes::checkout::start_checkout))
                            .route(
                                "/{session_id}",
                                web::get().to(routes::checkout::get_checkout),
                            )
                            .route(
                                "/{session_id}/guest-details",
                                web::put().to(routes::checkout::update_guest_details),
                            )
                            .route(
                                "/{session_id}/payment-method",
                                web::put().to(routes::checkout::update_payment_method),
                            )
                            .route(
                                "/{session_id}/voucher",
                                web::put().to(routes::checkout::select_voucher),
                            )
                            .route(
                                "/{session_id}/next",
                                web::post().to(routes::checkout::next_step),
                            )
                            .route(
                                "/{session_id}/back",
                                web::post().to(routes::checkout::previous_step),
                            )
                            .route(
                                "/{session_id}/submit",
                                web::post().to(routes::checkout::submit_checkout),
                            )
                            .route(
                                "/{session_id}",
                                web::delete().to(routes::checkout::abort_checkout),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
