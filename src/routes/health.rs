use actix_web::{web, HttpResponse, Responder};
use mongodb::{bson::doc, Client};
use serde::Serialize;
use std::env;
use std::sync::Arc;

#[derive(Serialize)]
struct HealthReport {
    status: &'static str,
    mongodb: DependencyStatus,
    environment: String,
    version: &'static str,
}

#[derive(Serialize)]
struct DependencyStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Liveness plus a MongoDB round trip. A failed ping reports the API as
/// degraded rather than down; the process itself is still serving.
pub async fn health_check(client: web::Data<Arc<Client>>) -> impl Responder {
    let mongodb = match ping_mongo(&client).await {
        Ok(()) => DependencyStatus {
            status: "ok",
            error: None,
        },
        Err(err) => {
            eprintln!("MongoDB health check failed: {}", err);
            DependencyStatus {
                status: "error",
                error: Some(err),
            }
        }
    };

    let status = if mongodb.status == "ok" {
        "ok"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthReport {
        status,
        mongodb,
        environment: env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn ping_mongo(client: &Client) -> Result<(), String> {
    client
        .database("Account")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|err| err.to_string())
}
