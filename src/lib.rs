//! # ctxmatrix
//!
//! Context vectors, a multiplicative compression transform over them, and a
//! synchronous trigger matrix that routes typed, signed triggers to
//! registered handlers.
//!
//! The [`ContextOrchestrator`] ties these together: it owns an in-memory
//! context store, registers the standard `context.*` handlers and exposes
//! them through [`ContextOrchestrator::process_context`].

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod persistence;
pub mod scoring;
pub mod security;
pub mod triggers;

pub use config::OrchestratorConfig;
pub use context::{compress, decompress, CompressionConfig, ContextVector, DenominatorPolicy};
pub use error::{ContextError, Result};
pub use logging::{LogLevel, LogSink};
pub use orchestrator::{ContextOperation, ContextOrchestrator, MetricsSnapshot};
pub use persistence::{register_persistence, PersistenceBackend, PersistenceQuery};
pub use scoring::ContextScorer;
pub use security::{Fingerprint, Signer};
pub use triggers::{Payload, Trigger, TriggerMatrix};
