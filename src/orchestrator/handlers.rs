//! The six standard `context.*` trigger handlers.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::state::ContextState;
use crate::context::compression::{compress, decompress, CompressionConfig};
use crate::context::vector::unix_now;
use crate::context::ContextVector;
use crate::error::ContextError;
use crate::logging::{LogLevel, LogSink};
use crate::triggers::routing::{
    CONTEXT_FROM_MAP, CONTEXT_LOG, CONTEXT_RETRIEVE, CONTEXT_STORE, CONTEXT_TO_MAP,
    CONTEXT_TRANSFORM,
};
use crate::triggers::{HandlerResult, Trigger, TriggerMatrix};

pub const TRANSFORM_COMPRESS: &str = "compress";
pub const TRANSFORM_DECOMPRESS: &str = "decompress";

pub const META_TRANSFORMATION_TYPE: &str = "transformationType";
pub const META_TRANSFORMED_AT: &str = "transformedAt";

pub(crate) fn register_standard_handlers(
    matrix: &TriggerMatrix,
    state: Arc<ContextState>,
    compression: CompressionConfig,
    sink: Arc<dyn LogSink>,
) {
    let store_state = state.clone();
    matrix.register_trigger(CONTEXT_STORE, move |t: &Trigger| {
        handle_store(&store_state, t)
    });

    let retrieve_state = state;
    matrix.register_trigger(CONTEXT_RETRIEVE, move |t: &Trigger| {
        handle_retrieve(&retrieve_state, t)
    });

    matrix.register_trigger(CONTEXT_TRANSFORM, move |t: &Trigger| {
        handle_transform(&compression, t)
    });
    matrix.register_trigger(CONTEXT_TO_MAP, handle_to_map);
    matrix.register_trigger(CONTEXT_FROM_MAP, handle_from_map);
    matrix.register_trigger(CONTEXT_LOG, move |t: &Trigger| handle_log(sink.as_ref(), t));
}

fn handle_store(state: &ContextState, trigger: &Trigger) -> HandlerResult {
    let context_id = trigger.payload_str("context_id")?;
    let vector = trigger.payload_vector("vector")?;
    state.store(context_id, vector, unix_now());
    Ok(json!({ "status": "stored", "context_id": context_id }))
}

fn handle_retrieve(state: &ContextState, trigger: &Trigger) -> HandlerResult {
    let context_id = trigger.payload_str("context_id")?;
    let vector = state.retrieve(context_id)?;
    Ok(Value::Object(vector.to_map()))
}

fn handle_transform(config: &CompressionConfig, trigger: &Trigger) -> HandlerResult {
    let source = trigger.payload_vector("source")?;
    let label = trigger.payload_str("transformation")?;

    let mut result = match label {
        TRANSFORM_COMPRESS => compress(&source, config)?,
        TRANSFORM_DECOMPRESS => decompress(&source),
        _ => return Ok(Value::Object(source.to_map())),
    };
    result
        .metadata
        .insert(META_TRANSFORMATION_TYPE.to_string(), Value::from(label));
    result
        .metadata
        .insert(META_TRANSFORMED_AT.to_string(), Value::from(unix_now()));
    Ok(Value::Object(result.to_map()))
}

fn handle_to_map(trigger: &Trigger) -> HandlerResult {
    let vector = trigger.payload_vector("vector")?;
    Ok(Value::Object(vector.to_map()))
}

fn handle_from_map(trigger: &Trigger) -> HandlerResult {
    let mut vector = ContextVector::from_map(trigger.payload_object("data")?);
    if let Some(meta) = trigger.optional_object("meta")? {
        for (key, value) in meta {
            vector.metadata.insert(key.clone(), value.clone());
        }
    }
    serde_json::to_value(&vector).map_err(|e| ContextError::handler(e.to_string()))
}

fn handle_log(sink: &dyn LogSink, trigger: &Trigger) -> HandlerResult {
    let message = trigger.payload_str("message")?;
    let level = match trigger.payload.get("level") {
        None | Some(Value::Null) => LogLevel::default(),
        Some(Value::String(name)) => LogLevel::parse(name)
            .ok_or_else(|| ContextError::invalid("level", "one of trace, debug, info, warn, error"))?,
        Some(_) => return Err(ContextError::invalid("level", "a string")),
    };
    let fields = trigger
        .optional_object("metadata")?
        .cloned()
        .unwrap_or_else(Map::new);
    sink.log(level, message, &fields);
    Ok(json!({ "logged": true }))
}

