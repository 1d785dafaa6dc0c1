//! Seams between the pipeline and its external collaborators.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Message, SensorReading};

/// Destination table for sensor readings.
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Create the `sensors` table if it is absent. Never fails because it exists.
    async fn ensure_schema(&self) -> Result<()>;

    /// Append one row, binding every value as a parameter.
    async fn insert(&self, reading: &SensorReading) -> Result<()>;

    /// Number of rows currently stored.
    async fn count(&self) -> Result<u64>;

    /// Column names of the `sensors` table, in declaration order.
    async fn columns(&self) -> Result<Vec<String>>;
}

/// Delivers a message over some channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: &Message) -> Result<()>;
}
