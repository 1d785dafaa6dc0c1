//! Run context: the per-run shared value store and progress tracker.
//!
//! One `RunContext` is created per run and dropped when both branches finish.
//! Values are written once per key by the extractor and read by everything
//! downstream; nothing in here outlives the run.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, OnceLock};

use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::types::{
    Branch, FIELD_HYDRAULIC_PRESSURE, FIELD_ID, FIELD_POWER_FACTOR, FIELD_TEMPERATURE,
    FIELD_TIMESTAMP, SensorReading,
};

/// Points a run passes through. A run is complete once both `Recorded` and
/// `Notified` are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunState {
    Waiting,
    Extracted,
    SchemaReady,
    Recorded,
    Routed,
    Notified,
}

#[derive(Debug)]
pub struct RunContext {
    run_id: String,
    logical_date: DateTime<Utc>,
    started_at: DateTime<Utc>,
    values: HashMap<String, String>,
    branch: OnceLock<Branch>,
    reached: Mutex<BTreeSet<RunState>>,
}

impl RunContext {
    pub fn new(logical_date: DateTime<Utc>) -> Self {
        Self {
            run_id: format!("run-{}", uuid::Uuid::new_v4()),
            logical_date,
            started_at: Utc::now(),
            values: HashMap::new(),
            branch: OnceLock::new(),
            reached: Mutex::new(BTreeSet::from([RunState::Waiting])),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn logical_date(&self) -> DateTime<Utc> {
        self.logical_date
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Publish a set of values at once. Either every key is new (to the run
    /// and within the batch) and all are stored, or nothing is.
    pub fn publish_all<'k, 'v>(
        &mut self,
        pairs: impl IntoIterator<Item = (&'k str, &'v str)>,
    ) -> Result<()> {
        let pairs: Vec<_> = pairs.into_iter().collect();
        let mut batch = HashSet::with_capacity(pairs.len());
        for (key, _) in &pairs {
            if self.values.contains_key(*key) {
                return Err(WindTurbineError::Context(format!("'{key}' was already published in this run")));
            }
            if !batch.insert(*key) {
                return Err(WindTurbineError::Context(format!("'{key}' appears twice in one publish")));
            }
        }
        for (key, value) in pairs {
            self.values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Publish the five reading fields and mark the run extracted.
    pub fn publish_reading(&mut self, reading: &SensorReading) -> Result<()> {
        self.publish_all(reading.fields())?;
        self.mark(RunState::Extracted);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| WindTurbineError::Context(format!("'{key}' has not been published in this run")))
    }

    /// Rebuild the reading from published values.
    pub fn reading(&self) -> Result<SensorReading> {
        Ok(SensorReading {
            id: self.get(FIELD_ID)?.to_string(),
            power_factor: self.get(FIELD_POWER_FACTOR)?.to_string(),
            hydraulic_pressure: self.get(FIELD_HYDRAULIC_PRESSURE)?.to_string(),
            temperature: self.get(FIELD_TEMPERATURE)?.to_string(),
            timestamp: self.get(FIELD_TIMESTAMP)?.to_string(),
        })
    }

    pub fn published(&self) -> usize {
        self.values.len()
    }

    /// Record the branch decision. Only the first decision sticks.
    pub fn set_branch(&self, branch: Branch) -> Result<()> {
        self.branch
            .set(branch)
            .map_err(|_| WindTurbineError::Context("branch was already decided in this run".into()))?;
        self.mark(RunState::Routed);
        Ok(())
    }

    pub fn branch(&self) -> Option<Branch> {
        self.branch.get().copied()
    }

    pub fn mark(&self, state: RunState) {
        if let Ok(mut reached) = self.reached.lock() {
            reached.insert(state);
        }
        tracing::debug!(run_id = %self.run_id, "run state → {state:?}");
    }

    pub fn has_reached(&self, state: RunState) -> bool {
        self.reached
            .lock()
            .map(|reached| reached.contains(&state))
            .unwrap_or(false)
    }

    /// Both terminal states reached.
    pub fn is_complete(&self) -> bool {
        self.has_reached(RunState::Recorded) && self.has_reached(RunState::Notified)
    }
}
