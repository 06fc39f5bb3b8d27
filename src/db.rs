//! Database connection and pool management.
//!
//! Initializes a SeaORM connection pool with configurable parameters and
//! retry with backoff for transient startup errors.

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

/// Errors that can occur during database initialization.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

const CONNECT_ATTEMPTS: u32 = 3;

/// Initializes a database connection pool with the given configuration.
///
/// Transient connection errors are retried with linear backoff; a pool is
/// only returned once a connection has been established.
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let mut options = ConnectOptions::new(&cfg.database_url);
    options
        .max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .sqlx_logging(false);

    let mut last_err = None;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match Database::connect(options.clone()).await {
            Ok(db) => {
                tracing::info!(
                    max_connections = cfg.db_max_connections,
                    "Database pool initialized"
                );
                return Ok(db);
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "Database connection attempt failed");
                last_err = Some(err);
                if attempt < CONNECT_ATTEMPTS {
                    sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
            }
        }
    }

    Err(DatabaseError::ConnectionFailed {
        source: last_err.expect("at least one connection attempt"),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_database_url() {
        let config = AppConfig {
            database_url: String::new(),
            ..AppConfig::default()
        };
        let result = init_pool(&config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn connects_to_in_memory_sqlite() {
        let config = AppConfig::default();
        let db = init_pool(&config).await.unwrap();
        assert!(db.ping().await.is_ok());
    }
}
