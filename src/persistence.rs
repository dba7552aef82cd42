//! Bridge from `persist.*` triggers to an external storage backend.
//!
//! The core owns no storage. [`register_persistence`] installs four handlers
//! on a [`TriggerMatrix`] that decode the payload and forward to a
//! [`PersistenceBackend`] supplied by the surrounding application.
//!
//! Payload contract:
//!
//! | trigger | fields | result |
//! |---|---|---|
//! | `persist.store` | `context_id`, `vector` | `{"stored": id}` |
//! | `persist.retrieve` | `context_id` | vector map |
//! | `persist.delete` | `context_id` | `{"deleted": bool}` |
//! | `persist.query` | optional `who`, `where`, `since`, `limit` | `{"results": [{"context_id", "vector"}]}` |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::context::ContextVector;
use crate::error::{ContextError, Result};
use crate::triggers::routing::{PERSIST_DELETE, PERSIST_QUERY, PERSIST_RETRIEVE, PERSIST_STORE};
use crate::triggers::{Trigger, TriggerMatrix};

/// Filter for [`PersistenceBackend::query`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceQuery {
    pub who: Option<String>,
    #[serde(rename = "where")]
    pub layer: Option<String>,
    /// Only vectors with `when >= since`.
    pub since: Option<i64>,
    pub limit: Option<usize>,
}

impl PersistenceQuery {
    /// True when `vector` passes every set filter.
    pub fn matches(&self, vector: &ContextVector) -> bool {
        self.who.as_deref().map_or(true, |who| vector.who == who)
            && self.layer.as_deref().map_or(true, |layer| vector.layer == layer)
            && self.since.map_or(true, |since| vector.when >= since)
    }
}

/// Storage implemented outside the core.
pub trait PersistenceBackend: Send + Sync {
    fn store(&self, context_id: &str, vector: &ContextVector) -> Result<()>;
    fn retrieve(&self, context_id: &str) -> Result<Option<ContextVector>>;
    /// Returns whether something was deleted.
    fn delete(&self, context_id: &str) -> Result<bool>;
    fn query(&self, query: &PersistenceQuery) -> Result<Vec<(String, ContextVector)>>;
}

/// Register the four `persist.*` handlers on `matrix`.
pub fn register_persistence(matrix: &TriggerMatrix, backend: Arc<dyn PersistenceBackend>) {
    let store = backend.clone();
    matrix.register_trigger(PERSIST_STORE, move |t: &Trigger| {
        let context_id = t.payload_str("context_id")?;
        let vector = t.payload_vector("vector")?;
        store.store(context_id, &vector)?;
        Ok(json!({ "stored": context_id }))
    });

    let retrieve = backend.clone();
    matrix.register_trigger(PERSIST_RETRIEVE, move |t: &Trigger| {
        let context_id = t.payload_str("context_id")?;
        match retrieve.retrieve(context_id)? {
            Some(vector) => Ok(Value::Object(vector.to_map())),
            None => Err(ContextError::NotFound {
                context_id: context_id.to_string(),
            }),
        }
    });

    let delete = backend.clone();
    matrix.register_trigger(PERSIST_DELETE, move |t: &Trigger| {
        let context_id = t.payload_str("context_id")?;
        let deleted = delete.delete(context_id)?;
        Ok(json!({ "deleted": deleted }))
    });

    let query = backend;
    matrix.register_trigger(PERSIST_QUERY, move |t: &Trigger| {
        let filter: PersistenceQuery =
            serde_json::from_value(Value::Object(t.payload.clone())).map_err(|e| {
                ContextError::invalid("query", format!("a valid query ({e})"))
            })?;
        let results: Vec<Value> = query
            .query(&filter)?
            .into_iter()
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|(id, vector)| json!({ "context_id": id, "vector": vector.to_map() }))
            .collect();
        Ok(json!({ "results": results }))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::StaticSigner;
    use crate::triggers::Payload;
    use parking_lot::RwLock;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MapBackend {
        rows: RwLock<BTreeMap<String, ContextVector>>,
    }

    impl PersistenceBackend for MapBackend {
        fn store(&self, context_id: &str, vector: &ContextVector) -> Result<()> {
            if context_id == "readonly" {
                return Err(ContextError::Persistence {
                    message: "read-only id".to_string(),
                });
            }
            self.rows.write().insert(context_id.to_string(), vector.clone());
            Ok(())
        }

        fn retrieve(&self, context_id: &str) -> Result<Option<ContextVector>> {
            Ok(self.rows.read().get(context_id).cloned())
        }

        fn delete(&self, context_id: &str) -> Result<bool> {
            Ok(self.rows.write().remove(context_id).is_some())
        }

        fn query(&self, query: &PersistenceQuery) -> Result<Vec<(String, ContextVector)>> {
            Ok(self
                .rows
                .read()
                .iter()
                .filter(|(_, v)| query.matches(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }
    }

    fn fire(matrix: &TriggerMatrix, trigger_type: &str, payload: Value) -> Result<Value> {
        let origin = ContextVector::new("persist-test", "io", "storage", "test", "trigger", 1.0);
        let payload: Payload = payload.as_object().cloned().unwrap_or_default();
        matrix.process_trigger(Trigger::new(
            trigger_type,
            "backend",
            &origin,
            payload,
            &StaticSigner::default(),
        ))
    }

    fn setup() -> TriggerMatrix {
        let matrix = TriggerMatrix::new();
        register_persistence(&matrix, Arc::new(MapBackend::default()));
        matrix
    }

    fn vector(who: &str, layer: &str, when: i64) -> Value {
        Value::Object(
            ContextVector::new(who, "sync", layer, "test", "manual", 2.0)
                .with_when(when)
                .to_map(),
        )
    }

    #[test]
    fn test_registers_four_types() {
        let matrix = setup();
        assert_eq!(
            matrix.registered_types(),
            vec![PERSIST_DELETE, PERSIST_QUERY, PERSIST_RETRIEVE, PERSIST_STORE]
        );
    }

    #[test]
    fn test_store_retrieve_delete() {
        let matrix = setup();
        let stored = fire(
            &matrix,
            PERSIST_STORE,
            json!({"context_id": "c1", "vector": vector("svc-A", "L6", 100)}),
        )
        .unwrap();
        assert_eq!(stored, json!({"stored": "c1"}));

        let got = fire(&matrix, PERSIST_RETRIEVE, json!({"context_id": "c1"})).unwrap();
        assert_eq!(got["who"], json!("svc-A"));
        assert_eq!(got["when"], json!(100));

        assert_eq!(
            fire(&matrix, PERSIST_DELETE, json!({"context_id": "c1"})).unwrap(),
            json!({"deleted": true})
        );
        assert_eq!(
            fire(&matrix, PERSIST_RETRIEVE, json!({"context_id": "c1"})),
            Err(ContextError::NotFound {
                context_id: "c1".to_string()
            })
        );
    }

    #[test]
    fn test_query_filters_and_limits() {
        let matrix = setup();
        for (id, who, layer, when) in [
            ("a", "svc-A", "L1", 10),
            ("b", "svc-A", "L2", 20),
            ("c", "svc-B", "L1", 30),
        ] {
            fire(
                &matrix,
                PERSIST_STORE,
                json!({"context_id": id, "vector": vector(who, layer, when)}),
            )
            .unwrap();
        }

        let by_who = fire(&matrix, PERSIST_QUERY, json!({"who": "svc-A"})).unwrap();
        assert_eq!(by_who["results"].as_array().unwrap().len(), 2);

        let recent = fire(&matrix, PERSIST_QUERY, json!({"where": "L1", "since": 15})).unwrap();
        let results = recent["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["context_id"], json!("c"));

        let limited = fire(&matrix, PERSIST_QUERY, json!({"limit": 1})).unwrap();
        assert_eq!(limited["results"].as_array().unwrap().len(), 1);

        assert!(matches!(
            fire(&matrix, PERSIST_QUERY, json!({"since": "yesterday"})),
            Err(ContextError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_backend_errors_propagate() {
        let matrix = setup();
        let err = fire(
            &matrix,
            PERSIST_STORE,
            json!({"context_id": "readonly", "vector": vector("svc-A", "L6", 1)}),
        )
        .unwrap_err();
        assert!(matches!(err, ContextError::Persistence { .. }));

        assert_eq!(
            fire(&matrix, PERSIST_STORE, json!({"context_id": "x"})),
            Err(ContextError::missing("vector"))
        );
        assert!(matches!(
            fire(&matrix, PERSIST_STORE, json!({"context_id": "x", "vector": {"who": 42}})),
            Err(ContextError::InvalidField { .. })
        ));
        assert_eq!(
            fire(&matrix, PERSIST_RETRIEVE, json!({"context_id": "x"})),
            Err(ContextError::NotFound {
                context_id: "x".to_string()
            })
        );
    }
}
