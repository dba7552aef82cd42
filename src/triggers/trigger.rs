//! Typed event carrying a context vector's narrative, a payload and a route.

use serde::Serialize;
use serde_json::{Map, Value};

use super::routing::{channel_class, trigger_priority, ChannelClass, Priority};
use crate::context::compression::is_compressed;
use crate::context::factors::fill_factor_defaults;
use crate::context::vector::{missing_narrative_fields, unix_now, ContextVector};
use crate::error::{ContextError, Result};
use crate::security::Signer;

/// Open payload handed to trigger handlers untouched.
pub type Payload = Map<String, Value>;

/// A single dispatchable event.
///
/// Built once, stamped with the current time and a signature, then moved into
/// [`TriggerMatrix::process_trigger`](super::matrix::TriggerMatrix::process_trigger).
/// The type, priority and channel class are fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trigger {
    pub who: String,
    pub what: String,
    pub when: i64,
    #[serde(rename = "where")]
    pub layer: String,
    pub why: String,
    pub how: String,
    trigger_type: String,
    priority: Priority,
    channel: ChannelClass,
    pub target: String,
    pub payload: Payload,
    pub compressed: bool,
    pub signature: String,
}

impl Trigger {
    /// Wrap `vector`'s narrative fields.
    ///
    /// `when` is the construction time, not the vector's own timestamp.
    /// `compressed` mirrors the vector's compression marker.
    pub fn new(
        trigger_type: impl Into<String>,
        target: impl Into<String>,
        vector: &ContextVector,
        payload: Payload,
        signer: &dyn Signer,
    ) -> Self {
        let trigger_type = trigger_type.into();
        Self {
            who: vector.who.clone(),
            what: vector.what.clone(),
            when: unix_now(),
            layer: vector.layer.clone(),
            why: vector.why.clone(),
            how: vector.how.clone(),
            priority: trigger_priority(&trigger_type),
            channel: channel_class(&trigger_type),
            trigger_type,
            target: target.into(),
            payload,
            compressed: is_compressed(vector),
            signature: signer.signature(),
        }
    }

    pub fn trigger_type(&self) -> &str {
        &self.trigger_type
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn channel(&self) -> ChannelClass {
        self.channel
    }

    /// Reject triggers whose narrative is incomplete.
    pub fn validate(&self) -> Result<()> {
        let missing = missing_narrative_fields(
            &self.who, &self.what, self.when, &self.layer, &self.why, &self.how,
        );
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContextError::Validation { missing })
        }
    }

    /// Payload string field, or a missing/invalid field error.
    pub fn payload_str(&self, field: &str) -> Result<&str> {
        match self.payload.get(field) {
            None | Some(Value::Null) => Err(ContextError::missing(field)),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ContextError::invalid(field, "a string")),
        }
    }

    /// Payload object field, or a missing/invalid field error.
    pub fn payload_object(&self, field: &str) -> Result<&Map<String, Value>> {
        match self.payload.get(field) {
            None | Some(Value::Null) => Err(ContextError::missing(field)),
            Some(Value::Object(map)) => Ok(map),
            Some(_) => Err(ContextError::invalid(field, "an object")),
        }
    }

    /// Payload field holding a vector in its strict serialized form.
    ///
    /// Mistyped fields are an [`ContextError::InvalidField`] error and an
    /// incomplete narrative is a validation error. Missing factors take their
    /// defaults.
    pub fn payload_vector(&self, field: &str) -> Result<ContextVector> {
        let raw = self.payload_object(field)?;
        let mut vector: ContextVector = serde_json::from_value(Value::Object(raw.clone()))
            .map_err(|e| ContextError::invalid(field, format!("a context vector ({e})")))?;
        vector.validate()?;
        fill_factor_defaults(&mut vector.metadata);
        Ok(vector)
    }

    /// Optional payload object field; absent or `null` is `Ok(None)`.
    pub fn optional_object(&self, field: &str) -> Result<Option<&Map<String, Value>>> {
        match self.payload.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(ContextError::invalid(field, "an object")),
        }
    }
}
