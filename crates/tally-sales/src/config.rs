//! Sales service configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. Role names and settlement sentinels have no default: they must
//! match what the identity service and the payment method table hold.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_core::{RoleTaxonomy, SettlementSentinels, CACHE_TTL_SECS, DEFAULT_RECEIPT_QUEUE};

/// Base URLs of the remote collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUrls {
    pub product: String,
    pub promotion: String,
    pub inventory: String,
    /// Store profiles and receipt numbering.
    pub store: String,
    /// Roles and users.
    pub identity: String,
}

/// Sales service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum pool size
    pub db_max_connections: u32,

    /// Redis connection string
    pub redis_url: String,

    /// Role names by scope level
    pub roles: RoleTaxonomy,

    /// Payment method names that select cash and pay-later settlement
    pub sentinels: SettlementSentinels,

    pub services: ServiceUrls,

    /// Timeout applied to every collaborator request
    pub http_timeout_secs: u64,

    /// Queue receiving serialized receipts
    pub receipt_queue: String,

    /// Cache entry lifetime
    pub cache_ttl_secs: u64,
}

impl SalesConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
        };
        let number = |key: &str, default: &str| {
            var(key, default)
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        };

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                var("SQL_USER", "tally"),
                var("SQL_PASSWORD", "tally"),
                var("SQL_HOST", "localhost"),
                var("SQL_PORT", "5432"),
                var("SQL_DB_NAME", "tally_pos"),
            ),
        };

        let redis_url = match (lookup("REDIS_URL"), lookup("REDIS_ADDR")) {
            (Some(url), _) => url,
            (None, Some(addr)) => format!("redis://{}", addr),
            (None, None) => "redis://localhost:6379".to_string(),
        };

        let db_max_connections = u32::try_from(number("DB_MAX_CONNECTIONS", "20")?)
            .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?;

        let config = SalesConfig {
            database_url,
            db_max_connections,
            redis_url,
            roles: RoleTaxonomy::new(
                required("SUPER_USER_ROLE")?,
                required("COMPANY_USER_ROLE")?,
                required("BRANCH_USER_ROLE")?,
                required("STORE_USER_ROLE")?,
            ),
            sentinels: SettlementSentinels::new(
                required("CASH_METHOD")?,
                required("PAY_LATER_METHOD")?,
            ),
            services: ServiceUrls {
                product: var("PRODUCT_SERVICE_URL", "http://localhost:8081"),
                promotion: var("PROMOTION_SERVICE_URL", "http://localhost:8082"),
                inventory: var("INVENTORY_SERVICE_URL", "http://localhost:8083"),
                store: var("STORE_SERVICE_URL", "http://localhost:8084"),
                identity: var("IDENTITY_SERVICE_URL", "http://localhost:8085"),
            },
            http_timeout_secs: number("HTTP_TIMEOUT_SECS", "10")?,
            receipt_queue: var("RECEIPT_QUEUE", DEFAULT_RECEIPT_QUEUE),
            cache_ttl_secs: number("CACHE_TTL_SECS", &CACHE_TTL_SECS.to_string())?,
        };

        if config.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("CACHE_TTL_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
