//! Health reporting for the storage backends.
//!
//! The database is required. Redis is degraded-but-serving: reads fall back
//! to the database, although updates and deletes fail until it returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_db::migrations::migration_status;
use tally_db::{Database, RedisCache};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingStatus {
    Serving,
    NotServing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ServingStatus,
    pub message: String,
    pub server_time: DateTime<Utc>,
}

/// Probes of each backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probes {
    pub database: bool,
    pub redis: bool,
    /// `(total, applied)`; `None` when the status query failed.
    pub migrations: Option<(usize, usize)>,
}

pub async fn check(database: &Database, cache: &RedisCache) -> HealthReport {
    let database_ok = database.health_check().await;
    let migrations = if database_ok {
        match migration_status(database.pool()).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "Could not read migration status");
                None
            }
        }
    } else {
        None
    };

    summarize(Probes {
        database: database_ok,
        redis: cache.health_check().await,
        migrations,
    })
}

pub fn summarize(probes: Probes) -> HealthReport {
    let (status, message) = if !probes.database {
        (ServingStatus::NotServing, "Database unhealthy".to_string())
    } else if let Some((total, applied)) = probes.migrations.filter(|(t, a)| a < t) {
        (
            ServingStatus::NotServing,
            format!("{} of {} migrations applied", applied, total),
        )
    } else if !probes.redis {
        (
            ServingStatus::Serving,
            "Degraded: Redis unhealthy".to_string(),
        )
    } else {
        (ServingStatus::Serving, "All systems operational".to_string())
    };

    HealthReport {
        status,
        message,
        server_time: Utc::now(),
    }
}
