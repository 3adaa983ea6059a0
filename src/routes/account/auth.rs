use actix_web::{web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::error::WriteError;
use mongodb::Client;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::middleware::auth::Claims;
use crate::models::user::{User, UserSession};
use crate::services::loyalty::interface::LoyaltyOperations;
use crate::services::loyalty::store::MongoLoyaltyStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    auth_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninInput {
    pub email: String,
    pub password: String,
}

pub async fn signup(
    data: web::Data<Arc<Client>>,
    loyalty: web::Data<Arc<MongoLoyaltyStore>>,
    input: web::Json<SignupInput>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database("Account").collection("Users");

    let input = input.into_inner();
    if !is_valid_email(&input.email) {
        return HttpResponse::BadRequest().body("Invalid email address");
    }

    let curr_time = Utc::now();
    let user = User {
        id: None,
        email: input.email,
        password: bcrypt::hash(input.password, bcrypt::DEFAULT_COST).unwrap_or("".to_string()),
        first_name: input.first_name,
        last_name: input.last_name,
        phone_number: input.phone_number,
        last_signin: None,
        failed_signins: None,
        created_at: Some(curr_time),
        updated_at: Some(curr_time),
    };

    match collection.insert_one(&user).await {
        Ok(result) => {
            let user_id = result.inserted_id.as_object_id().unwrap();

            // Every account starts the loyalty program at zero points
            if let Err(err) = loyalty.init_balance(user_id).await {
                eprintln!("Failed to initialize loyalty balance: {:?}", err);
            }

            match generate_token(&user.email, user_id) {
                Ok(token) => HttpResponse::Ok().json(TokenResponse { auth_token: token }),
                Err(_) => HttpResponse::InternalServerError().body("Token generation failed"),
            }
        }
        Err(err) if is_duplicate_key(&err) => HttpResponse::Conflict().body("User already exists"),
        Err(err) => {
            eprintln!("Failed to create user: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create user")
        }
    }
}

// The unique index on email reports a duplicate as write error 11000
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(WriteError {
            code: 11000,
            ..
        }))
    )
}

pub async fn signin(data: web::Data<Arc<Client>>, input: web::Json<SigninInput>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database("Account").collection("Users");
    let input = input.into_inner();

    let user = match collection.find_one(doc! { "email": &input.email }).await {
        Ok(Some(user)) => user,
        Ok(None) => return HttpResponse::NotFound().body("User not found"),
        Err(err) => {
            eprintln!("Database error: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to sign in.");
        }
    };

    if !bcrypt::verify(&input.password, &user.password).unwrap_or(false) {
        let strikes = user.failed_signins.unwrap_or(0) + 1;
        let update = doc! { "$set": { "failed_signins": strikes } };
        if let Err(err) = collection.update_one(doc! { "email": &input.email }, update).await {
            eprintln!("Failed to record failed signin: {:?}", err);
        }
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    let update = doc! {
        "$set": {
            "last_signin": Utc::now().to_rfc3339(),
            "failed_signins": 0
        }
    };
    if let Err(err) = collection.update_one(doc! { "email": &input.email }, update).await {
        eprintln!("Failed to record signin: {:?}", err);
    }

    let user_id = match user.id {
        Some(id) => id,
        None => return HttpResponse::InternalServerError().body("Failed to sign in."),
    };

    match generate_token(&user.email, user_id) {
        Ok(token) => HttpResponse::Ok().json(TokenResponse { auth_token: token }),
        Err(_) => HttpResponse::InternalServerError().body("Token generation failed"),
    }
}

pub async fn user_session(data: web::Data<Arc<Client>>, claims: Claims) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database("Account").collection("Users");

    let user_id = match ObjectId::parse_str(&claims.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID format"),
    };

    match collection.find_one(doc! { "_id": user_id }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(UserSession {
            id: user.id.unwrap_or(user_id),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }),
        Ok(None) => HttpResponse::NotFound().body("User not found"),
        Err(err) => {
            eprintln!("Database error: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch session")
        }
    }
}

fn generate_token(email: &str, user_id: ObjectId) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(24)).timestamp() as usize,
        user_id: user_id.to_string(),
    };

    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn is_valid_email(email: &str) -> bool {
    match Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$") {
        Ok(re) => re.is_match(email),
        Err(_) => false,
    }
}
