//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, ResendEmailAdapter, SupabaseStorageAdapter},
    config::Config,
    error::ApiError,
    web::{
        self,
        rest::ApiDoc,
        state::{AdminCredentials, AppState},
    },
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront_core::{AdminService, OrderIngestionService, ProductCatalog};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    let products = db_adapter.list_products().await?;
    if products.is_empty() {
        warn!("The product catalog is empty; every checkout will be rejected.");
    } else {
        info!("Catalog holds {} products.", products.len());
    }

    // --- 3. Initialize Service Adapters ---
    let http = reqwest::Client::new();
    let storage_adapter = Arc::new(SupabaseStorageAdapter::new(
        http.clone(),
        &config.supabase_url,
        config.supabase_service_key.clone(),
        config.proof_bucket.clone(),
    ));
    let email_adapter = Arc::new(ResendEmailAdapter::new(
        http,
        config.resend_api_key.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let ingestion = OrderIngestionService::new(
        db_adapter.clone(),
        db_adapter.clone(),
        storage_adapter,
        email_adapter.clone(),
        config.notifications.clone(),
        config.delivery_fee,
    );
    let admin = AdminService::new(
        db_adapter.clone(),
        db_adapter.clone(),
        db_adapter.clone(),
        email_adapter,
        config.notifications.clone(),
    );
    let app_state = Arc::new(AppState {
        ingestion,
        admin,
        catalog: db_adapter.clone(),
        sessions: db_adapter,
        admin_credentials: AdminCredentials {
            email: config.admin_email.clone(),
            password_hash: config.admin_password_hash.clone(),
        },
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
