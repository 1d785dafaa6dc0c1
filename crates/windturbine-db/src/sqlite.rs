//! SQLite backend for the `sensors` table.

use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::traits::SensorStore;
use windturbine_core::types::SensorReading;

use crate::CREATE_SENSORS_TABLE;

pub struct SqliteSensorStore {
    conn: Mutex<Connection>,
}

fn storage(e: impl std::fmt::Display) -> WindTurbineError {
    WindTurbineError::Storage(e.to_string())
}

impl SqliteSensorStore {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage)?;
        tracing::debug!("🗄️ SQLite sensors store opened at {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Private in-memory database, dropped with the store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// All rows in insertion order.
    pub fn rows(&self) -> Result<Vec<SensorReading>> {
        let conn = self.conn.lock().map_err(storage)?;
        let mut stmt = conn
            .prepare(
                "SELECT idtemp, powerfactor, hydraulicpressure, temperature, timestamp
                 FROM sensors ORDER BY rowid",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SensorReading {
                    id: row.get(0)?,
                    power_factor: row.get(1)?,
                    hydraulic_pressure: row.get(2)?,
                    temperature: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })
            .map_err(storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }
}

#[async_trait]
impl SensorStore for SqliteSensorStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(storage)?;
        conn.execute_batch(CREATE_SENSORS_TABLE)
            .map_err(|e| WindTurbineError::Storage(format!("Create table: {e}")))?;
        Ok(())
    }

    async fn insert(&self, reading: &SensorReading) -> Result<()> {
        let conn = self.conn.lock().map_err(storage)?;
        conn.execute(
            "INSERT INTO sensors (idtemp, powerfactor, hydraulicpressure, temperature, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                reading.id,
                reading.power_factor,
                reading.hydraulic_pressure,
                reading.temperature,
                reading.timestamp,
            ],
        )
        .map_err(|e| WindTurbineError::Storage(format!("Insert: {e}")))?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().map_err(storage)?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM sensors", [], |r| r.get(0))
            .map_err(storage)?;
        Ok(n as u64)
    }

    async fn columns(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().map_err(storage)?;
        let mut stmt = conn.prepare("PRAGMA table_info(sensors)").map_err(storage)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(storage)?;
        names.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }
}
