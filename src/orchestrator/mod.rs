//! Stateful façade over one [`TriggerMatrix`] and an in-memory context store.
//!
//! The orchestrator registers the six `context.*` handlers at construction
//! and exposes them through [`ContextOrchestrator::process_context`], which
//! counts every dispatch and every failure. Connections between contexts are
//! maintained only by callers; the orchestrator never infers them.

pub mod handlers;
pub mod metrics;
mod state;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use self::state::ContextState;
use crate::config::OrchestratorConfig;
use crate::context::vector::unix_now;
use crate::context::ContextVector;
use crate::error::Result;
use crate::logging::{LogCrateSink, LogSink};
use crate::scoring::{bounded_score, ContextScorer};
use crate::security::{FingerprintSigner, Signer};
use crate::triggers::routing::{
    CONTEXT_FROM_MAP, CONTEXT_LOG, CONTEXT_RETRIEVE, CONTEXT_STORE, CONTEXT_TO_MAP,
    CONTEXT_TRANSFORM,
};
use crate::triggers::{Payload, Trigger, TriggerMatrix};

pub use metrics::MetricsSnapshot;

/// The standard operations reachable through `process_context`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextOperation {
    Store,
    Retrieve,
    Transform,
    ToMap,
    FromMap,
    Log,
}

impl ContextOperation {
    pub const ALL: [ContextOperation; 6] = [
        Self::Store,
        Self::Retrieve,
        Self::Transform,
        Self::ToMap,
        Self::FromMap,
        Self::Log,
    ];

    pub fn trigger_type(&self) -> &'static str {
        match self {
            Self::Store => CONTEXT_STORE,
            Self::Retrieve => CONTEXT_RETRIEVE,
            Self::Transform => CONTEXT_TRANSFORM,
            Self::ToMap => CONTEXT_TO_MAP,
            Self::FromMap => CONTEXT_FROM_MAP,
            Self::Log => CONTEXT_LOG,
        }
    }
}

impl FromStr for ContextOperation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "store" => Ok(Self::Store),
            "retrieve" => Ok(Self::Retrieve),
            "transform" => Ok(Self::Transform),
            "to_map" | "to-map" => Ok(Self::ToMap),
            "from_map" | "from-map" => Ok(Self::FromMap),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown context operation '{other}'")),
        }
    }
}

/// Owner of the context store and the trigger matrix that serves it.
pub struct ContextOrchestrator {
    matrix: Arc<TriggerMatrix>,
    state: Arc<ContextState>,
    config: OrchestratorConfig,
    signer: Arc<dyn Signer>,
}

impl ContextOrchestrator {
    /// Orchestrator signing with a fingerprint seeded by the configured
    /// identity and logging through the `log` facade.
    pub fn new(config: OrchestratorConfig) -> Self {
        let signer = Arc::new(FingerprintSigner::seeded(&config.identity));
        Self::with_collaborators(config, signer, Arc::new(LogCrateSink))
    }

    /// Orchestrator with explicit signer and log sink.
    pub fn with_collaborators(
        config: OrchestratorConfig,
        signer: Arc<dyn Signer>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let matrix = Arc::new(TriggerMatrix::new());
        let state = Arc::new(ContextState::default());
        handlers::register_standard_handlers(
            &matrix,
            state.clone(),
            config.compression.clone(),
            sink,
        );
        log::debug!(
            "ContextOrchestrator '{}' ready with {:?}",
            config.identity,
            matrix
        );
        Self {
            matrix,
            state,
            config,
            signer,
        }
    }

    /// Dispatch an operation through the matrix and update the counters.
    ///
    /// `operation` is one of the standard names (`store`, `retrieve`,
    /// `transform`, `to_map`, `from_map`, `log`) or any trigger type
    /// registered on [`Self::matrix`].
    pub fn process_context(&self, operation: &str, data: Payload) -> Result<Value> {
        let trigger_type = operation
            .parse::<ContextOperation>()
            .map(|op| op.trigger_type())
            .unwrap_or(operation);

        let origin = ContextVector::new(
            self.config.identity.as_str(),
            operation,
            self.config.layer.as_str(),
            "context management",
            "process_context",
            0.0,
        );
        let trigger = Trigger::new(
            trigger_type,
            self.config.target.as_str(),
            &origin,
            data,
            self.signer.as_ref(),
        );

        let result = self.matrix.process_trigger(trigger);
        self.state.record(result.is_err());
        if let Err(err) = &result {
            log::debug!("process_context '{}' failed: {}", operation, err);
        }
        result
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.state.snapshot()
    }

    /// Record that `from` relates to `to`. Returns false for a duplicate edge.
    pub fn connect(&self, from: &str, to: &str) -> bool {
        self.state.connect(from, to, unix_now())
    }

    pub fn connections(&self, context_id: &str) -> Vec<String> {
        self.state.connections(context_id)
    }

    /// Delete a context, its activity stamp and every edge touching it.
    pub fn forget(&self, context_id: &str) -> bool {
        self.state.forget(context_id)
    }

    /// Stored context ids, sorted.
    pub fn context_ids(&self) -> Vec<String> {
        self.state.context_ids()
    }

    /// Score a stored vector, clamped to `[0, 1]`.
    pub fn score(&self, context_id: &str, scorer: &dyn ContextScorer) -> Result<f64> {
        let vector = self.state.retrieve(context_id)?;
        Ok(bounded_score(scorer, &vector))
    }

    /// The matrix the standard handlers live on.
    pub fn matrix(&self) -> &Arc<TriggerMatrix> {
        &self.matrix
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

impl Default for ContextOrchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}

impl fmt::Debug for ContextOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOrchestrator")
            .field("identity", &self.config.identity)
            .field("matrix", &self.matrix)
            .field("metrics", &self.metrics())
            .finish()
    }
}
