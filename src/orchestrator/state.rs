//! Shared mutable state behind the orchestrator and its handlers.
//!
//! Lock order when more than one map is held: memory, connections, activity.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::metrics::{Counters, MetricsSnapshot};
use crate::context::ContextVector;
use crate::error::{ContextError, Result};

#[derive(Debug, Default)]
pub(crate) struct ContextState {
    memory: RwLock<HashMap<String, ContextVector>>,
    connections: RwLock<HashMap<String, Vec<String>>>,
    activity: RwLock<HashMap<String, i64>>,
    counters: RwLock<Counters>,
}

impl ContextState {
    pub fn store(&self, context_id: &str, vector: ContextVector, now: i64) {
        let mut memory = self.memory.write();
        let mut activity = self.activity.write();
        memory.insert(context_id.to_string(), vector);
        activity.insert(context_id.to_string(), now);
    }

    pub fn retrieve(&self, context_id: &str) -> Result<ContextVector> {
        self.memory
            .read()
            .get(context_id)
            .cloned()
            .ok_or_else(|| ContextError::NotFound {
                context_id: context_id.to_string(),
            })
    }

    pub fn context_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.memory.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Add `from -> to`; returns false if the edge already existed.
    pub fn connect(&self, from: &str, to: &str, now: i64) -> bool {
        let mut connections = self.connections.write();
        let mut activity = self.activity.write();
        let edges = connections.entry(from.to_string()).or_default();
        if edges.iter().any(|existing| existing == to) {
            return false;
        }
        edges.push(to.to_string());
        activity.insert(from.to_string(), now);
        true
    }

    pub fn connections(&self, context_id: &str) -> Vec<String> {
        self.connections
            .read()
            .get(context_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove every trace of `context_id`, including edges pointing at it.
    pub fn forget(&self, context_id: &str) -> bool {
        let mut memory = self.memory.write();
        let mut connections = self.connections.write();
        let mut activity = self.activity.write();

        let mut removed = memory.remove(context_id).is_some();
        removed |= connections.remove(context_id).is_some();
        for edges in connections.values_mut() {
            let before = edges.len();
            edges.retain(|to| to != context_id);
            removed |= edges.len() != before;
        }
        connections.retain(|_, edges| !edges.is_empty());
        removed |= activity.remove(context_id).is_some();
        removed
    }

    pub fn record(&self, failed: bool) {
        self.counters.write().record(failed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let memory = self.memory.read();
        let connections = self.connections.read();
        let activity = self.activity.read();
        let counters = *self.counters.read();
        MetricsSnapshot {
            processed: counters.processed,
            errors: counters.errors,
            memory_size: memory.len(),
            connection_count: connections.values().map(Vec::len).sum(),
            last_activity: activity.values().copied().max(),
        }
    }
}
