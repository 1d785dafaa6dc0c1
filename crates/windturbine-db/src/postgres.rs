//! PostgreSQL backend for the `sensors` table.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::traits::SensorStore;
use windturbine_core::types::SensorReading;

use crate::CREATE_SENSORS_TABLE;

#[derive(Clone)]
pub struct PostgresSensorStore {
    pool: PgPool,
}

impl PostgresSensorStore {
    /// Connect with the default pool parameters.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with_options(database_url, 5, 5).await
    }

    /// Connect with explicit pool parameters.
    ///
    /// The pool is lazy about the table: nothing is created until
    /// [`SensorStore::ensure_schema`] runs.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| WindTurbineError::Storage(format!("Failed to connect postgres: {e}")))?;
        tracing::info!("🐘 Connected to PostgreSQL (max {max_connections} connections)");
        Ok(Self { pool })
    }
}

#[async_trait]
impl SensorStore for PostgresSensorStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_SENSORS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| WindTurbineError::Storage(format!("Create table: {e}")))?;
        Ok(())
    }

    async fn insert(&self, reading: &SensorReading) -> Result<()> {
        sqlx::query(
            "INSERT INTO sensors (idtemp, powerfactor, hydraulicpressure, temperature, timestamp)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&reading.id)
        .bind(&reading.power_factor)
        .bind(&reading.hydraulic_pressure)
        .bind(&reading.temperature)
        .bind(&reading.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| WindTurbineError::Storage(format!("Insert: {e}")))?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sensors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| WindTurbineError::Storage(format!("Count: {e}")))?;
        Ok(n as u64)
    }

    async fn columns(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT column_name::text FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = 'sensors'
             ORDER BY ordinal_position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WindTurbineError::Storage(format!("Describe table: {e}")))
    }
}
