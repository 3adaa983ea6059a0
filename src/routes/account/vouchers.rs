use actix_web::{web, HttpResponse, Responder};
use bson::oid::ObjectId;
use std::sync::Arc;

use crate::middleware::auth_context::AuthenticatedUser;
use crate::services::loyalty::interface::{LoyaltyError, LoyaltyOperations};
use crate::services::loyalty::store::MongoLoyaltyStore;

pub async fn get_my_vouchers(
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

    match loyalty.redeemable_vouchers(user_id).await {
        Ok(vouchers) => HttpResponse::Ok().json(vouchers),
        Err(err) => {
            eprintln!("Error fetching vouchers: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch vouchers")
        }
    }
}

/// Spend points on a catalog entry. The store handles the debit and the
/// stock decrement atomically, so a failed claim never moves points.
pub async fn claim_voucher(
    loyalty: web::Data<Arc<MongoLoyaltyStore>>,
    path: web::Path<(String, String)>,
    user: AuthenticatedUser,
) -> impl Responder {
    let (user_id, catalog_id) = path.into_inner();
    if user_id != user.user_id {
        return HttpResponse::Forbidden().body("Forbidden");
    }

    let user_id = match ObjectId::parse_str(&user.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID format"),
    };
    let catalog_id = match ObjectId::parse_str(&catalog_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid voucher ID format"),
    };

    match loyalty.claim_voucher(user_id, catalog_id).await {
        Ok((voucher, balance)) => HttpResponse::Ok().json(serde_json::json!({
            "voucher": voucher,
            "balance": balance.points,
        })),
        Err(LoyaltyError::InsufficientPoints) => {
            HttpResponse::BadRequest().body("Not enough points to claim this voucher")
        }
        Err(LoyaltyError::VoucherUnavailable) => {
            HttpResponse::Conflict().body("Voucher no longer available")
        }
        Err(err) => {
            eprintln!("Error claiming voucher: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to claim voucher")
        }
    }
}
