//! Extractor: reads the sensor file, consumes it, and publishes its fields.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::types::{
    FIELD_HYDRAULIC_PRESSURE, FIELD_ID, FIELD_POWER_FACTOR, FIELD_TEMPERATURE, FIELD_TIMESTAMP,
    SensorReading,
};

use crate::context::RunContext;

pub struct Extractor {
    path: PathBuf,
}

impl Extractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file and remove it. The file is only removed once the whole
    /// record has parsed; on any error it stays where it was.
    pub fn read_reading(&self) -> Result<SensorReading> {
        let raw = std::fs::read(&self.path)?;
        let reading = parse_reading(raw)?;
        std::fs::remove_file(&self.path)?;
        tracing::debug!("🗑️ Consumed {}", self.path.display());
        Ok(reading)
    }

    /// Publish a consumed reading's five fields into the run context.
    pub fn publish(&self, ctx: &mut RunContext, reading: &SensorReading) -> Result<()> {
        ctx.publish_reading(reading)?;
        tracing::info!(
            run_id = ctx.run_id(),
            "📥 Extracted reading '{}' (temperature {})",
            reading.id,
            reading.temperature
        );
        Ok(())
    }

    /// Read, consume and publish in one step.
    pub fn extract(&self, ctx: &mut RunContext) -> Result<SensorReading> {
        let reading = self.read_reading()?;
        self.publish(ctx, &reading)?;
        Ok(reading)
    }
}

/// Parse a JSON object holding the five sensor keys. Extra keys are ignored.
/// Content that is not UTF-8 JSON is a parse error like any other bad content.
pub fn parse_reading(raw: impl AsRef<[u8]>) -> Result<SensorReading> {
    let value: Value = serde_json::from_slice(raw.as_ref())
        .map_err(|e| WindTurbineError::Parse(format!("Invalid JSON: {e}")))?;
    let record = match value {
        Value::Object(record) => record,
        other => {
            return Err(WindTurbineError::Parse(format!(
                "Expected a JSON object, got {}",
                type_name(&other)
            )));
        }
    };

    Ok(SensorReading {
        id: field(&record, FIELD_ID)?,
        power_factor: field(&record, FIELD_POWER_FACTOR)?,
        hydraulic_pressure: field(&record, FIELD_HYDRAULIC_PRESSURE)?,
        temperature: field(&record, FIELD_TEMPERATURE)?,
        timestamp: field(&record, FIELD_TIMESTAMP)?,
    })
}

/// Strings are taken as-is; numbers and booleans keep their JSON text.
fn field(record: &Map<String, Value>, key: &str) -> Result<String> {
    match record.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        Some(other) => Err(WindTurbineError::Parse(format!(
            "Key '{key}' must be a scalar, got {}",
            type_name(other)
        ))),
        None => Err(WindTurbineError::Parse(format!("Missing key '{key}'"))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const VALID: &str = r#"{"idtemp":"T1","powerfactor":"0.9","hydraulicpressure":"120","temperature":"32.5","timestamp":"2025-08-10T00:00:00"}"#;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("windturbine-test-{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("data.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_extract_publishes_and_consumes() {
        let path = write_temp("extract-valid", VALID);
        let mut ctx = RunContext::new(Utc::now());

        let reading = Extractor::new(&path).extract(&mut ctx).unwrap();
        assert_eq!(reading.id, "T1");
        assert_eq!(ctx.get("idtemp").unwrap(), "T1");
        assert_eq!(ctx.get("powerfactor").unwrap(), "0.9");
        assert_eq!(ctx.get("hydraulicpressure").unwrap(), "120");
        assert_eq!(ctx.get("temperature").unwrap(), "32.5");
        assert_eq!(ctx.get("timestamp").unwrap(), "2025-08-10T00:00:00");
        assert!(!path.exists());
        cleanup(&path);
    }

    #[test]
    fn test_missing_key_keeps_file() {
        let path = write_temp(
            "extract-missing",
            r#"{"idtemp":"T1","powerfactor":"0.9","hydraulicpressure":"120","temperature":"32.5"}"#,
        );
        let mut ctx = RunContext::new(Utc::now());

        let err = Extractor::new(&path).extract(&mut ctx).unwrap_err();
        assert!(matches!(err, WindTurbineError::Parse(ref m) if m.contains("timestamp")));
        assert!(path.exists());
        assert_eq!(ctx.published(), 0);
        cleanup(&path);
    }

    #[test]
    fn test_malformed_json_keeps_file() {
        let path = write_temp("extract-malformed", "{\"idtemp\": \"T1\",");
        let err = Extractor::new(&path).read_reading().unwrap_err();
        assert!(matches!(err, WindTurbineError::Parse(_)));
        assert!(path.exists());
        cleanup(&path);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error_and_keeps_file() {
        let path = write_temp("extract-utf8", "");
        std::fs::write(&path, b"{\"idtemp\":\"\xff\xfe\"}").unwrap();

        let err = Extractor::new(&path).read_reading().unwrap_err();
        assert_eq!(err.kind(), "parse", "{err}");
        assert!(path.exists());
        cleanup(&path);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(parse_reading("[1, 2, 3]"), Err(WindTurbineError::Parse(_))));
        assert!(matches!(parse_reading("\"T1\""), Err(WindTurbineError::Parse(_))));
    }

    #[test]
    fn test_rejects_null_and_nested_values() {
        let null = VALID.replace("\"120\"", "null");
        assert!(matches!(parse_reading(&null), Err(WindTurbineError::Parse(_))));
        let nested = VALID.replace("\"0.9\"", "{\"v\":0.9}");
        assert!(matches!(parse_reading(&nested), Err(WindTurbineError::Parse(_))));
    }

    #[test]
    fn test_scalar_values_keep_their_text() {
        let reading = parse_reading(
            r#"{"idtemp":7,"powerfactor":0.9,"hydraulicpressure":true,"temperature":32.5,"timestamp":"t","extra":[1]}"#,
        )
        .unwrap();
        assert_eq!(reading.id, "7");
        assert_eq!(reading.power_factor, "0.9");
        assert_eq!(reading.hydraulic_pressure, "true");
        assert_eq!(reading.temperature, "32.5");
    }

    #[test]
    fn test_strings_are_byte_for_byte() {
        let raw = r#"{"idtemp":" T 1 ","powerfactor":"0.90","hydraulicpressure":"1e2","temperature":"032.50","timestamp":"2025-08-10T00:00:00Z"}"#;
        let reading = parse_reading(raw).unwrap();
        assert_eq!(reading.id, " T 1 ");
        assert_eq!(reading.power_factor, "0.90");
        assert_eq!(reading.hydraulic_pressure, "1e2");
        assert_eq!(reading.temperature, "032.50");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("windturbine-absent-{}.json", uuid::Uuid::new_v4()));
        assert!(matches!(Extractor::new(path).read_reading(), Err(WindTurbineError::Io(_))));
    }
}
