use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Client;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::Claims;
use crate::models::attraction::Attraction;
use crate::models::booking::{BookingDetails, GuestInfo, PaymentMethod, ProductKind};
use crate::models::hotel::Hotel;
use crate::models::pricing::RateQuote;
use crate::services::checkout_service::{
    CheckoutError, CheckoutSession, CheckoutSessionStore, CheckoutStep, GuestDetails,
    ProductSelection,
};
use crate::services::loyalty::interface::{LoyaltyError, LoyaltyOperations};
use crate::services::loyalty::store::MongoLoyaltyStore;
use crate::services::loyalty_service::LoyaltyService;
use crate::services::pricing_service::{
    PricingError, PricingService, ATTRACTION_TAX_BASIS_POINTS, HOTEL_TAX_BASIS_POINTS,
};

#[derive(Deserialize)]
pub struct StartCheckoutInput {
    pub kind: ProductKind,
    pub product_id: String,
    pub rooms: Option<i64>,
    pub tickets: Option<i64>,
}

#[derive(Deserialize)]
pub struct PaymentMethodInput {
    pub payment_method: PaymentMethod,
}

#[derive(Deserialize)]
pub struct VoucherSelectionInput {
    pub voucher_id: Option<String>,
}

fn checkout_error_response(err: CheckoutError) -> HttpResponse {
    match err {
        CheckoutError::MissingFields(fields) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Required fields missing or invalid",
            "fields": fields,
        })),
        CheckoutError::InvalidTransition { .. } => HttpResponse::Conflict().body(err.to_string()),
        CheckoutError::SessionClosed => HttpResponse::Conflict().body(err.to_string()),
    }
}

fn parse_session_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw)
        .map_err(|_| HttpResponse::BadRequest().body("Invalid checkout session ID format"))
}

/// Fetch a session, enforcing that it belongs to the caller.
fn owned_session(
    sessions: &CheckoutSessionStore,
    session_id: &Uuid,
    claims: &Claims,
) -> Result<CheckoutSession, HttpResponse> {
    let session = sessions
        .get(session_id)
        .ok_or_else(|| HttpResponse::NotFound().body("Checkout session not found"))?;

    if session.user_id != ObjectId::parse_str(&claims.user_id).unwrap() {
        return Err(HttpResponse::Forbidden().body("Forbidden"));
    }
    Ok(session)
}

pub async fn start_checkout(
    data: web::Data<Arc<Client>>,
    sessions: web::Data<CheckoutSessionStore>,
    input: web::Json<StartCheckoutInput>,
    claims: Claims,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let product_id = match ObjectId::parse_str(&input.product_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid product ID format"),
    };

    // Verify the product exists before opening a session for it
    let product = match input.kind {
        ProductKind::Hotel => {
            let collection: mongodb::Collection<Hotel> =
                client.database("Catalog").collection("Hotels");
            match collection.find_one(doc! { "_id": product_id }).await {
                Ok(Some(_)) => ProductSelection::Hotel {
                    hotel_id: product_id,
                    rooms: input.rooms.unwrap_or(1),
                },
                Ok(None) => return HttpResponse::NotFound().body("Hotel not found"),
                Err(err) => {
                    eprintln!("Error fetching hotel: {:?}", err);
                    return HttpResponse::InternalServerError().body("Failed to fetch hotel");
                }
            }
        }
        ProductKind::Attraction => {
            let collection: mongodb::Collection<Attraction> =
                client.database("Catalog").collection("Attractions");
            match collection.find_one(doc! { "_id": product_id }).await {
                Ok(Some(_)) => ProductSelection::Attraction {
                    attraction_id: product_id,
                    tickets: input.tickets.unwrap_or(1),
                },
                Ok(None) => return HttpResponse::NotFound().body("Attraction not found"),
                Err(err) => {
                    eprintln!("Error fetching attraction: {:?}", err);
                    return HttpResponse::InternalServerError().body("Failed to fetch attraction");
                }
            }
        }
    };

    let session = CheckoutSession::new(ObjectId::parse_str(&claims.user_id).unwrap(), product);
    let response = HttpResponse::Ok().json(&session);
    sessions.insert(session);
    response
}

pub async fn get_checkout(
    sessions: web::Data<CheckoutSessionStore>,
    path: web::Path<(String,)>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match owned_session(&sessions, &session_id, &claims) {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(resp) => resp,
    }
}

pub async fn update_guest_details(
    sessions: web::Data<CheckoutSessionStore>,
    path: web::Path<(String,)>,
    input: web::Json<GuestDetails>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = owned_session(&sessions, &session_id, &claims) {
        return resp;
    }

    let result = sessions.with_session(&session_id, |session| {
        session.set_guest_details(input.into_inner())
    });

    match result {
        Some(Ok(())) => HttpResponse::Ok().body("Guest details updated"),
        Some(Err(err)) => checkout_error_response(err),
        None => HttpResponse::NotFound().body("Checkout session not found"),
    }
}

pub async fn update_payment_method(
    sessions: web::Data<CheckoutSessionStore>,
    path: web::Path<(String,)>,
    input: web::Json<PaymentMethodInput>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = owned_session(&sessions, &session_id, &claims) {
        return resp;
    }

    let result = sessions.with_session(&session_id, |session| {
        session.set_payment_method(input.payment_method)
    });

    match result {
        Some(Ok(())) => HttpResponse::Ok().body("Payment method updated"),
        Some(Err(err)) => checkout_error_response(err),
        None => HttpResponse::NotFound().body("Checkout session not found"),
    }
}

pub async fn select_voucher(
    sessions: web::Data<CheckoutSessionStore>,
    loyalty: web::Data<Arc<MongoLoyaltyStore>>,
    path: web::Path<(String,)>,
    input: web::Json<VoucherSelectionInput>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = owned_session(&sessions, &session_id, &claims) {
        return resp;
    }

    let voucher_id = match &input.voucher_id {
        Some(raw) => match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => return HttpResponse::BadRequest().body("Invalid voucher ID format"),
        },
        None => None,
    };

    // Make sure the voucher is still redeemable before pinning it to the
    // session; consumption itself happens at submission.
    if let Some(voucher_id) = voucher_id {
        let user_id = ObjectId::parse_str(&claims.user_id).unwrap();
        match loyalty.find_voucher(user_id, voucher_id).await {
            Ok(voucher) if !voucher.is_used => {}
            Ok(_) | Err(LoyaltyError::VoucherUnavailable) => {
                return HttpResponse::Conflict().body("Voucher no longer available");
            }
            Err(err) => {
                eprintln!("Error fetching voucher: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to fetch voucher");
            }
        }
    }

    let result =
        sessions.with_session(&session_id, |session| session.select_voucher(voucher_id));

    match result {
        Some(Ok(())) => HttpResponse::Ok().body("Voucher selection updated"),
        Some(Err(err)) => checkout_error_response(err),
        None => HttpResponse::NotFound().body("Checkout session not found"),
    }
}

pub async fn next_step(
    sessions: web::Data<CheckoutSessionStore>,
    path: web::Path<(String,)>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = owned_session(&sessions, &session_id, &claims) {
        return resp;
    }

    let result = sessions.with_session(&session_id, |session| session.advance());

    match result {
        Some(Ok(step)) => HttpResponse::Ok().json(serde_json::json!({ "step": step })),
        Some(Err(err)) => checkout_error_response(err),
        None => HttpResponse::NotFound().body("Checkout session not found"),
    }
}

pub async fn previous_step(
    sessions: web::Data<CheckoutSessionStore>,
    path: web::Path<(String,)>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = owned_session(&sessions, &session_id, &claims) {
        return resp;
    }

    let result = sessions.with_session(&session_id, |session| session.step_back());

    match result {
        Some(Ok(step)) => HttpResponse::Ok().json(serde_json::json!({ "step": step })),
        Some(Err(err)) => checkout_error_response(err),
        None => HttpResponse::NotFound().body("Checkout session not found"),
    }
}

/// Abandoning a checkout has no external side effect; the session is
/// simply dropped.
pub async fn abort_checkout(
    sessions: web::Data<CheckoutSessionStore>,
    path: web::Path<(String,)>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = owned_session(&sessions, &session_id, &claims) {
        return resp;
    }

    let result = sessions.with_session(&session_id, |session| session.abort());

    match result {
        Some(Ok(())) => {
            sessions.remove(&session_id);
            HttpResponse::Ok().body("Checkout aborted")
        }
        Some(Err(err)) => checkout_error_response(err),
        None => HttpResponse::NotFound().body("Checkout session not found"),
    }
}

async fn quote_for_session(
    client: &Client,
    session: &CheckoutSession,
) -> Result<RateQuote, HttpResponse> {
    match session.product {
        ProductSelection::Hotel { hotel_id, .. } => {
            let collection: mongodb::Collection<Hotel> =
                client.database("Catalog").collection("Hotels");
            match collection.find_one(doc! { "_id": hotel_id }).await {
                Ok(Some(hotel)) => Ok(PricingService::rate_quote(
                    hotel.nightly_rate,
                    hotel.flash_sale.as_ref(),
                    session.quantity(),
                    HOTEL_TAX_BASIS_POINTS,
                )),
                Ok(None) => Err(HttpResponse::NotFound().body("Hotel not found")),
                Err(err) => {
                    eprintln!("Error fetching hotel: {:?}", err);
                    Err(HttpResponse::InternalServerError().body("Failed to fetch hotel"))
                }
            }
        }
        ProductSelection::Attraction { attraction_id, .. } => {
            let collection: mongodb::Collection<Attraction> =
                client.database("Catalog").collection("Attractions");
            match collection.find_one(doc! { "_id": attraction_id }).await {
                Ok(Some(attraction)) => Ok(PricingService::rate_quote(
                    attraction.ticket_price,
                    attraction.flash_sale.as_ref(),
                    session.quantity(),
                    ATTRACTION_TAX_BASIS_POINTS,
                )),
                Ok(None) => Err(HttpResponse::NotFound().body("Attraction not found")),
                Err(err) => {
                    eprintln!("Error fetching attraction: {:?}", err);
                    Err(HttpResponse::InternalServerError().body("Failed to fetch attraction"))
                }
            }
        }
    }
}

/// Freeze the charge, consume the voucher, persist the booking and award
/// points. A failure before the insert releases the voucher and leaves the
/// session on review so the guest can retry with the same frozen inputs.
pub async fn submit_checkout(
    mongodb_data: web::Data<Arc<Client>>,
    loyalty_data: web::Data<Arc<MongoLoyaltyStore>>,
    sessions: web::Data<CheckoutSessionStore>,
    path: web::Path<(String,)>,
    claims: Claims,
) -> impl Responder {
    let session_id = match parse_session_id(&path.into_inner().0) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let session = match owned_session(&sessions, &session_id, &claims) {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    let user_id = session.user_id;

    if session.step != CheckoutStep::ReviewAndConfirm {
        return HttpResponse::Conflict().body("Checkout is not ready to submit");
    }

    let client = mongodb_data.into_inner();
    let loyalty = loyalty_data.into_inner();
    let collection: mongodb::Collection<BookingDetails> =
        client.database("Account").collection("Bookings");

    // 1. A retried submission of the same attempt must not book twice
    match collection
        .find_one(doc! { "session_id": session_id.to_string() })
        .await
    {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().body("Booking already exists for this checkout");
        }
        Ok(None) => {}
        Err(err) => {
            eprintln!("Error checking for existing booking: {:?}", err);
            return HttpResponse::InternalServerError()
                .body("Failed to check for existing booking");
        }
    }

    // 2. Re-quote server-side and freeze the charge
    let quote = match quote_for_session(&client, &session).await {
        Ok(quote) => quote,
        Err(resp) => return resp,
    };

    let voucher = match session.voucher_id {
        Some(voucher_id) => match loyalty.find_voucher(user_id, voucher_id).await {
            Ok(voucher) => Some(voucher),
            Err(LoyaltyError::VoucherUnavailable) => {
                return HttpResponse::Conflict().body("Voucher no longer available");
            }
            Err(err) => {
                eprintln!("Error fetching voucher: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to fetch voucher");
            }
        },
        None => None,
    };

    let charge = match PricingService::charge_breakdown(&quote, voucher.as_ref()) {
        Ok(charge) => charge,
        Err(PricingError::VoucherAlreadyUsed) => {
            return HttpResponse::Conflict().body("Voucher no longer available");
        }
        Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
    };

    // 3. Take the voucher out of circulation before money changes hands
    if let Some(voucher_id) = session.voucher_id {
        match loyalty.consume_voucher(user_id, voucher_id).await {
            Ok(_) => {}
            Err(LoyaltyError::VoucherUnavailable) => {
                return HttpResponse::Conflict().body("Voucher no longer available");
            }
            Err(err) => {
                eprintln!("Error consuming voucher: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to apply voucher");
            }
        }
    }

    // 4. Persist the booking. Points are computed here, on the server,
    //    from the frozen total.
    let points_earned = LoyaltyService::accrue(charge.total);
    let (rooms, tickets) = match session.product {
        ProductSelection::Hotel { rooms, .. } => (Some(rooms), None),
        ProductSelection::Attraction { tickets, .. } => (None, Some(tickets)),
    };
    let time = DateTime::now();

    let booking = BookingDetails {
        id: None,
        user_id,
        product_kind: session.product.kind(),
        product_id: session.product.product_id(),
        session_id: session_id.to_string(),
        guest: GuestInfo {
            name: session.guest.name.clone(),
            email: session.guest.email.clone(),
            phone: session.guest.phone.clone(),
        },
        check_in: session.guest.check_in,
        check_out: session.guest.check_out,
        visit_date: session.guest.visit_date,
        rooms,
        tickets,
        payment_method: session.payment_method,
        voucher_id: session.voucher_id,
        charge: charge.clone(),
        points_earned,
        status: "confirmed".to_string(),
        created_at: Some(time),
        updated_at: Some(time),
    };

    match collection.insert_one(&booking).await {
        Ok(insert_result) => {
            let booking_id = insert_result
                .inserted_id
                .as_object_id()
                .unwrap()
                .to_string();

            // 5. Award the points and retire the session
            let award = loyalty.credit_points(user_id, points_earned).await;

            let _ = sessions.with_session(&session_id, |session| session.mark_submitted());
            sessions.remove(&session_id);

            match award {
                Ok(balance) => HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "booking_id": booking_id,
                    "charge": charge,
                    "points_earned": points_earned,
                    "balance": balance.points,
                })),
                Err(err) => {
                    eprintln!("Error awarding points for booking {}: {:?}", booking_id, err);
                    HttpResponse::Ok().json(serde_json::json!({
                        "success": true,
                        "warning": "Booking confirmed, but loyalty points could not be awarded",
                        "booking_id": booking_id,
                        "charge": charge,
                        "points_earned": points_earned,
                    }))
                }
            }
        }
        Err(err) => {
            eprintln!("Error creating booking: {:?}", err);
            // Put the voucher back; the session stays on review for a retry
            if let Some(voucher_id) = session.voucher_id {
                let _ = loyalty.release_voucher(user_id, voucher_id).await;
            }
            HttpResponse::InternalServerError().body("Failed to create booking")
        }
    }
}
