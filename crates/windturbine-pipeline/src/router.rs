//! Threshold router: picks the notification branch from the temperature.

use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::types::{Branch, FIELD_TEMPERATURE};

use crate::context::RunContext;

#[derive(Debug, Clone, Copy)]
pub struct ThresholdRouter {
    threshold: f64,
}

impl ThresholdRouter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `Alert` at or above the threshold, `Normal` below it.
    /// NaN compares false and therefore routes to `Normal`.
    pub fn decide(&self, temperature: &str) -> Result<Branch> {
        let value: f64 = temperature.trim().parse().map_err(|e| {
            WindTurbineError::Type(format!("temperature '{temperature}' is not a number: {e}"))
        })?;
        Ok(if value >= self.threshold { Branch::Alert } else { Branch::Normal })
    }

    /// Decide from the published temperature and record the branch in the run.
    pub fn route(&self, ctx: &RunContext) -> Result<Branch> {
        let temperature = ctx.get(FIELD_TEMPERATURE)?;
        let branch = self.decide(temperature)?;
        ctx.set_branch(branch)?;
        tracing::info!(
            run_id = ctx.run_id(),
            "🌡️ Temperature {temperature} vs {} → {branch}",
            self.threshold
        );
        Ok(branch)
    }
}

impl Default for ThresholdRouter {
    fn default() -> Self {
        Self::new(30.0)
    }
}
