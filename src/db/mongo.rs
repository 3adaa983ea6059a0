use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client,
};
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_POOL_SIZE: u32 = 10;

/// Build the pooled client the whole API shares. Bad configuration fails
/// loudly at startup instead of on the first request.
pub async fn create_mongo_client(uri: &str) -> Arc<Client> {
    let mut options = ClientOptions::parse(uri)
        .await
        .expect("MONGODB_URI could not be parsed");

    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    options.connect_timeout = Some(Duration::from_secs(CONNECT_TIMEOUT_SECS));
    options.server_selection_timeout = Some(Duration::from_secs(CONNECT_TIMEOUT_SECS));
    options.max_pool_size = Some(MAX_POOL_SIZE);
    options.min_pool_size = Some(1);
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

    let client = Client::with_options(options).expect("Failed to create MongoDB client");

    // Startup ping; a failure here is only a warning, the pool retries on
    // first use
    match client.database("Account").run_command(doc! { "ping": 1 }).await {
        Ok(_) => println!("Connected to MongoDB"),
        Err(err) => eprintln!("WARNING: MongoDB ping failed at startup: {}", err),
    }

    Arc::new(client)
}
