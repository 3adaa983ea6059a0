use actix_web::{web, HttpResponse, Responder};
use bson::oid::ObjectId;
use std::sync::Arc;

use crate::middleware::auth_context::AuthenticatedUser;
use crate::services::loyalty::interface::{LoyaltyError, LoyaltyOperations};
use crate::services::loyalty::store::MongoLoyaltyStore;
use crate::services::loyalty_service::LoyaltyService;

/// Current balance resolved against the tier table. The tier is derived
/// on every read, never stored.
pub async fn get_loyalty_status(
    loyalty: web::Data<Arc<MongoLoyaltyStore>>,
    path: web::Path<(String,)>,
    user: AuthenticatedUser,
) -> impl Responder {
    if path.into_inner().0 != user.user_id {
        return HttpResponse::Forbidden().body("Forbidden");
    }

    let user_id = match ObjectId::parse_str(&user.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID format"),
    };

    match loyalty.get_balance(user_id).await {
        Ok(balance) => HttpResponse::Ok().json(LoyaltyService::tier_status(balance.points)),
        Err(LoyaltyError::BalanceNotFound) => {
            HttpResponse::NotFound().body("Loyalty balance not found")
        }
        Err(err) => {
            eprintln!("Error fetching loyalty balance: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch loyalty balance")
        }
    }
}
