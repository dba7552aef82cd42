//! Type-keyed trigger registry and synchronous dispatcher.
//!
//! One handler per trigger type; registering again replaces it. Dispatch
//! validates the trigger, classifies it for the audit log, and calls the
//! handler on the caller's thread. There is no queue, retry or preemption.
//!
//! The registry sits behind a reader-writer lock. The handler is cloned out
//! of the map before it runs, so handlers may register or unregister other
//! triggers (including their own) while executing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::routing::{channel_class, trigger_priority, Priority};
use super::trigger::Trigger;
use crate::error::{ContextError, Result};

/// Value returned by a handler, passed back to the caller unchanged.
pub type HandlerResult = Result<Value>;

/// A registered trigger handler.
pub type TriggerHandler = Arc<dyn Fn(&Trigger) -> HandlerResult + Send + Sync>;

/// Registry of trigger handlers keyed by trigger type.
#[derive(Default)]
pub struct TriggerMatrix {
    handlers: RwLock<HashMap<String, TriggerHandler>>,
}

impl TriggerMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `handler` with `trigger_type`.
    ///
    /// Replaces any previous handler; returns `true` when one was replaced.
    pub fn register_trigger<F>(&self, trigger_type: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&Trigger) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_handler(trigger_type, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn register_handler(&self, trigger_type: impl Into<String>, handler: TriggerHandler) -> bool {
        let trigger_type = trigger_type.into();
        log::debug!("TriggerMatrix: registering handler for '{}'", trigger_type);
        self.handlers.write().insert(trigger_type, handler).is_some()
    }

    /// Remove the handler for `trigger_type`; returns whether one existed.
    pub fn unregister_trigger(&self, trigger_type: &str) -> bool {
        self.handlers.write().remove(trigger_type).is_some()
    }

    /// Check if a handler is registered for a type.
    pub fn has_handler(&self, trigger_type: &str) -> bool {
        self.handlers.read().contains_key(trigger_type)
    }

    /// All registered types, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Priority tier for a type. Not used by dispatch itself.
    pub fn trigger_priority(&self, trigger_type: &str) -> Priority {
        trigger_priority(trigger_type)
    }

    /// Validate, classify, audit and dispatch a trigger.
    ///
    /// Returns a validation error without touching any handler when the
    /// narrative is incomplete, [`ContextError::NoHandler`] for unknown
    /// types, and otherwise whatever the handler returns.
    pub fn process_trigger(&self, trigger: Trigger) -> HandlerResult {
        if let Err(err) = trigger.validate() {
            log::warn!(
                "TriggerMatrix: rejected '{}' for '{}': {}",
                trigger.trigger_type(),
                trigger.target,
                err
            );
            return Err(err);
        }

        let class = channel_class(trigger.trigger_type());
        log::info!(
            "TriggerMatrix: type={} class={} target={}",
            trigger.trigger_type(),
            class,
            trigger.target
        );

        let handler = self.handlers.read().get(trigger.trigger_type()).cloned();
        let Some(handler) = handler else {
            log::warn!(
                "TriggerMatrix: no handler for '{}'",
                trigger.trigger_type()
            );
            return Err(ContextError::NoHandler {
                trigger_type: trigger.trigger_type().to_string(),
            });
        };

        handler(&trigger)
    }
}

impl fmt::Debug for TriggerMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerMatrix")
            .field("handlers", &self.registered_types())
            .finish()
    }
}
