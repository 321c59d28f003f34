//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use storefront_core::domain::Amount;
use storefront_core::notifications::NotificationSettings;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub proof_bucket: String,
    pub resend_api_key: String,
    pub notifications: NotificationSettings,
    pub delivery_fee: Amount,
    pub admin_email: String,
    pub admin_password_hash: String,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str = optional("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = optional("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = optional("CORS_ORIGIN", "http://localhost:3000");

        // --- Object Storage and Email Delivery ---
        let supabase_url = required("SUPABASE_URL")?;
        let supabase_service_key = required("SUPABASE_SERVICE_ROLE_KEY")?;
        let proof_bucket = optional("PROOF_BUCKET", "payment-receipts");
        let resend_api_key = required("RESEND_API_KEY")?;

        let notifications = NotificationSettings {
            orders_from: optional("ORDERS_FROM_ADDRESS", "Shapes Orders <onboarding@resend.dev>"),
            confirmation_from: optional(
                "CONFIRMATION_FROM_ADDRESS",
                "Shapes Online <orders@shapeslagos.online>",
            ),
            operator_email: required("OPERATOR_EMAIL")?,
            site_url: optional("SITE_URL", "http://localhost:3000"),
            store_name: optional("STORE_NAME", "Shapes Online"),
        };

        // --- Checkout Settings ---
        let delivery_fee_str = optional("DELIVERY_FEE", "2500");
        let delivery_fee = delivery_fee_str
            .parse::<Amount>()
            .ok()
            .filter(|fee| *fee >= 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DELIVERY_FEE".to_string(),
                    format!("'{}' is not a non-negative whole amount", delivery_fee_str),
                )
            })?;

        // --- Admin Credentials ---
        let admin_email = required("ADMIN_EMAIL")?;
        let admin_password_hash = required("ADMIN_PASSWORD_HASH")?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            supabase_url,
            supabase_service_key,
            proof_bucket,
            resend_api_key,
            notifications,
            delivery_fee,
            admin_email,
            admin_password_hash,
        })
    }
}
