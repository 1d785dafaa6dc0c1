//! # Windturbine DB
//! The `sensors` table: schema initialization and row recording.
//!
//! Two backends implement [`SensorStore`]:
//! - [`PostgresSensorStore`]: production target (sqlx pool)
//! - [`SqliteSensorStore`]: local runs and tests (rusqlite)

pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

use windturbine_core::config::{DatabaseConfig, expand_path};
use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::traits::SensorStore;

pub use postgres::PostgresSensorStore;
pub use sqlite::SqliteSensorStore;

/// Five text columns, one per input key. No key, no uniqueness: rows are appended.
pub const CREATE_SENSORS_TABLE: &str = "CREATE TABLE IF NOT EXISTS sensors (
    idtemp VARCHAR,
    powerfactor VARCHAR,
    hydraulicpressure VARCHAR,
    temperature VARCHAR,
    timestamp VARCHAR
)";

/// Open the backend selected by the URL scheme.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn SensorStore>> {
    let url = config.url.trim();
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let store = PostgresSensorStore::connect_with_options(
            url,
            config.max_connections,
            config.connect_timeout_secs,
        )
        .await?;
        return Ok(Arc::new(store));
    }

    if url == "sqlite::memory:" {
        return Ok(Arc::new(SqliteSensorStore::in_memory()?));
    }
    if let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    {
        let path = expand_path(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        return Ok(Arc::new(SqliteSensorStore::open(&path)?));
    }

    Err(WindTurbineError::Config(format!(
        "Unsupported database url '{url}' (expected postgres:// or sqlite:)"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_selects_sqlite() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".into(),
            ..DatabaseConfig::default()
        };
        let store = connect(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let config = DatabaseConfig {
            url: "mysql://localhost/sensors".into(),
            ..DatabaseConfig::default()
        };
        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, WindTurbineError::Config(_)));
    }
}
