//! Orchestrator configuration.
//!
//! Defaults can be overlaid from a JSON object ([`OrchestratorConfig::from_value`])
//! or from the environment ([`OrchestratorConfig::from_env`]):
//!
//! - `CTXMATRIX_IDENTITY`: `who` of orchestrator triggers
//! - `CTXMATRIX_LAYER`: `where` of orchestrator triggers
//! - `CTXMATRIX_TARGET`: trigger target
//! - `CTXMATRIX_DENOMINATOR_POLICY`: `reject` or `clamp`
//! - `CTXMATRIX_MIN_DENOMINATOR`: float
//! - `CTXMATRIX_TIME_WINDOW_SECS`: float

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::compression::{CompressionConfig, DenominatorPolicy};
use crate::error::{ContextError, Result};

pub const ENV_IDENTITY: &str = "CTXMATRIX_IDENTITY";
pub const ENV_LAYER: &str = "CTXMATRIX_LAYER";
pub const ENV_TARGET: &str = "CTXMATRIX_TARGET";
pub const ENV_DENOMINATOR_POLICY: &str = "CTXMATRIX_DENOMINATOR_POLICY";
pub const ENV_MIN_DENOMINATOR: &str = "CTXMATRIX_MIN_DENOMINATOR";
pub const ENV_TIME_WINDOW_SECS: &str = "CTXMATRIX_TIME_WINDOW_SECS";

/// Settings for a [`ContextOrchestrator`](crate::orchestrator::ContextOrchestrator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// `who` of the vectors the orchestrator signs its own triggers with.
    pub identity: String,
    /// `where` of those vectors.
    pub layer: String,
    /// Target recorded on orchestrator triggers.
    pub target: String,
    pub compression: CompressionConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            identity: "context-orchestrator".to_string(),
            layer: "core".to_string(),
            target: "orchestrator".to_string(),
            compression: CompressionConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Overlay a JSON object onto the defaults.
    ///
    /// Nested objects are merged key by key, so `{"compression": {"min_denominator": 0.1}}`
    /// keeps the other compression defaults.
    pub fn from_value(value: &Value) -> Result<Self> {
        let overrides = value
            .as_object()
            .ok_or_else(|| ContextError::invalid("config", "an object"))?;
        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        merge_objects(&mut merged, overrides);
        serde_json::from_value(Value::Object(merged))
            .map_err(|e| ContextError::invalid("config", format!("a valid configuration ({e})")))
    }

    /// Defaults overlaid with `CTXMATRIX_*` variables from the process environment.
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with("CTXMATRIX_"))
            .collect();
        Self::from_vars(&vars)
    }

    /// Defaults overlaid with the given variables. Unparsable values are
    /// logged and ignored.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let mut config = Self::default();
        if let Some(identity) = vars.get(ENV_IDENTITY) {
            config.identity = identity.clone();
        }
        if let Some(layer) = vars.get(ENV_LAYER) {
            config.layer = layer.clone();
        }
        if let Some(target) = vars.get(ENV_TARGET) {
            config.target = target.clone();
        }
        if let Some(raw) = vars.get(ENV_DENOMINATOR_POLICY) {
            match raw.parse::<DenominatorPolicy>() {
                Ok(policy) => config.compression.denominator_policy = policy,
                Err(e) => log::warn!("ignoring {}: {}", ENV_DENOMINATOR_POLICY, e),
            }
        }
        if let Some(value) = parse_float(vars, ENV_MIN_DENOMINATOR) {
            config.compression.min_denominator = value;
        }
        if let Some(value) = parse_float(vars, ENV_TIME_WINDOW_SECS) {
            config.compression.time_window_secs = value;
        }
        config
    }
}

fn parse_float(vars: &HashMap<String, String>, key: &str) -> Option<f64> {
    let raw = vars.get(key)?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        _ => {
            log::warn!("ignoring {}: '{}' is not a positive number", key, raw);
            None
        }
    }
}

fn merge_objects(base: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_objects(existing, nested);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
