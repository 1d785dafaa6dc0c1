//! # Windturbine Core
//! Shared configuration, error taxonomy, domain types and the traits the
//! pipeline uses to reach storage and notification channels.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::WindTurbineConfig;
pub use error::{Result, WindTurbineError};
pub use traits::{Notifier, SensorStore};
pub use types::{Branch, Message, SensorReading};
