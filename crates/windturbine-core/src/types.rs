//! Domain types passed between pipeline tasks.

use serde::{Deserialize, Serialize};

/// Keys of the input record, in table column order.
pub const FIELD_ID: &str = "idtemp";
pub const FIELD_POWER_FACTOR: &str = "powerfactor";
pub const FIELD_HYDRAULIC_PRESSURE: &str = "hydraulicpressure";
pub const FIELD_TEMPERATURE: &str = "temperature";
pub const FIELD_TIMESTAMP: &str = "timestamp";

pub const SENSOR_FIELDS: [&str; 5] = [
    FIELD_ID,
    FIELD_POWER_FACTOR,
    FIELD_HYDRAULIC_PRESSURE,
    FIELD_TEMPERATURE,
    FIELD_TIMESTAMP,
];

/// One reading from a turbine's sensor file. All values are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: String,
    pub power_factor: String,
    pub hydraulic_pressure: String,
    pub temperature: String,
    pub timestamp: String,
}

impl SensorReading {
    /// Values in column order, matching [`SENSOR_FIELDS`].
    pub fn values(&self) -> [&str; 5] {
        [
            &self.id,
            &self.power_factor,
            &self.hydraulic_pressure,
            &self.temperature,
            &self.timestamp,
        ]
    }

    /// `(key, value)` pairs in column order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        SENSOR_FIELDS.into_iter().zip(self.values())
    }
}

/// Which notification branch the threshold router selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    Alert,
    Normal,
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Branch::Alert => write!(f, "alert"),
            Branch::Normal => write!(f, "normal"),
        }
    }
}

/// A message handed to a [`crate::traits::Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_follow_column_order() {
        let reading = SensorReading {
            id: "T1".into(),
            power_factor: "0.9".into(),
            hydraulic_pressure: "120".into(),
            temperature: "32.5".into(),
            timestamp: "2025-08-10T00:00:00".into(),
        };
        let fields: Vec<_> = reading.fields().collect();
        assert_eq!(fields[0], ("idtemp", "T1"));
        assert_eq!(fields[3], ("temperature", "32.5"));
        assert_eq!(fields[4], ("timestamp", "2025-08-10T00:00:00"));
    }
}
