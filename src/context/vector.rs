//! The seven-dimensional context record exchanged between components.
//!
//! A [`ContextVector`] answers who / what / when / where / why / how and
//! carries a scalar `extent` (scope or impact). Open `metadata` holds the
//! compression factors from [`super::factors`] and any free-form annotations.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::factors::{fill_factor_defaults, number, numeric};
use crate::error::{ContextError, Result};

pub const KEY_WHO: &str = "who";
pub const KEY_WHAT: &str = "what";
pub const KEY_WHEN: &str = "when";
pub const KEY_WHERE: &str = "where";
pub const KEY_WHY: &str = "why";
pub const KEY_HOW: &str = "how";
pub const KEY_EXTENT: &str = "extent";
pub const KEY_SOURCE: &str = "source";
pub const KEY_METADATA: &str = "metadata";

/// Extent used when a map carries none.
pub const DEFAULT_EXTENT: f64 = 0.0;

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Context record accompanying every cross-component event.
///
/// Treated as immutable once built: transforms return modified copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVector {
    /// Actor.
    pub who: String,
    /// Action label.
    pub what: String,
    /// Unix seconds; non-zero once finalized.
    pub when: i64,
    /// Logical layer.
    #[serde(rename = "where")]
    pub layer: String,
    /// Intent.
    pub why: String,
    /// Mechanism.
    pub how: String,
    /// Scope / impact. Rewritten by compression.
    pub extent: f64,
    /// Provenance, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Compression factors and annotations.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ContextVector {
    /// Build a vector stamped with the current time and default factors.
    pub fn new(
        who: impl Into<String>,
        what: impl Into<String>,
        layer: impl Into<String>,
        why: impl Into<String>,
        how: impl Into<String>,
        extent: f64,
    ) -> Self {
        let mut metadata = Map::new();
        fill_factor_defaults(&mut metadata);
        Self {
            who: who.into(),
            what: what.into(),
            when: unix_now(),
            layer: layer.into(),
            why: why.into(),
            how: how.into(),
            extent,
            source: None,
            metadata,
        }
    }

    pub fn with_when(mut self, when: i64) -> Self {
        self.when = when;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Replace metadata; factor keys missing from `metadata` get defaults.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        fill_factor_defaults(&mut self.metadata);
        self
    }

    /// Names of the narrative dimensions that are missing.
    pub fn missing_fields(&self) -> Vec<String> {
        missing_narrative_fields(
            &self.who, &self.what, self.when, &self.layer, &self.why, &self.how,
        )
    }

    /// True when who/what/where/why/how are non-empty and `when` is set.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Reject incomplete vectors.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContextError::Validation { missing })
        }
    }

    /// Number of populated dimensions out of the seven core ones.
    pub fn populated_dimensions(&self) -> usize {
        [
            !self.who.is_empty(),
            !self.what.is_empty(),
            self.when != 0,
            !self.layer.is_empty(),
            !self.why.is_empty(),
            !self.how.is_empty(),
            self.extent != 0.0,
        ]
        .iter()
        .filter(|populated| **populated)
        .count()
    }

    /// Open key-value form.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(KEY_WHO.into(), Value::String(self.who.clone()));
        map.insert(KEY_WHAT.into(), Value::String(self.what.clone()));
        map.insert(KEY_WHEN.into(), Value::from(self.when));
        map.insert(KEY_WHERE.into(), Value::String(self.layer.clone()));
        map.insert(KEY_WHY.into(), Value::String(self.why.clone()));
        map.insert(KEY_HOW.into(), Value::String(self.how.clone()));
        map.insert(KEY_EXTENT.into(), number(self.extent));
        if let Some(source) = &self.source {
            map.insert(KEY_SOURCE.into(), Value::String(source.clone()));
        }
        map.insert(KEY_METADATA.into(), Value::Object(self.metadata.clone()));
        map
    }

    /// Rebuild a vector from its open form.
    ///
    /// Never fails: missing or mistyped fields take the same defaults as
    /// [`ContextVector::new`] (empty strings, current time, zero extent,
    /// default factors).
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let when = map
            .get(KEY_WHEN)
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            })
            .unwrap_or_else(unix_now);
        let extent = map
            .get(KEY_EXTENT)
            .and_then(numeric)
            .unwrap_or(DEFAULT_EXTENT);
        let source = map
            .get(KEY_SOURCE)
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut metadata = map
            .get(KEY_METADATA)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        fill_factor_defaults(&mut metadata);

        Self {
            who: text(KEY_WHO),
            what: text(KEY_WHAT),
            when,
            layer: text(KEY_WHERE),
            why: text(KEY_WHY),
            how: text(KEY_HOW),
            extent,
            source,
            metadata,
        }
    }

    /// Combine two observations of the same context.
    ///
    /// The operand with the larger `when` is the update (`b` wins ties). The
    /// result takes the update's narrative fields, `when`, `extent` and
    /// `source`; metadata is the base's overlaid with the update's.
    pub fn merge(a: &ContextVector, b: &ContextVector) -> ContextVector {
        let (base, update) = if a.when > b.when { (b, a) } else { (a, b) };
        let mut metadata = base.metadata.clone();
        for (key, value) in &update.metadata {
            metadata.insert(key.clone(), value.clone());
        }
        ContextVector {
            metadata,
            ..update.clone()
        }
    }
}

/// Shared completeness rule for vectors and triggers.
pub(crate) fn missing_narrative_fields(
    who: &str,
    what: &str,
    when: i64,
    layer: &str,
    why: &str,
    how: &str,
) -> Vec<String> {
    let mut missing = Vec::new();
    for (name, value) in [
        (KEY_WHO, who),
        (KEY_WHAT, what),
        (KEY_WHERE, layer),
        (KEY_WHY, why),
        (KEY_HOW, how),
    ] {
        if value.is_empty() {
            missing.push(name.to_string());
        }
    }
    if when == 0 {
        missing.push(KEY_WHEN.to_string());
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::factors::FACTOR_DEFAULTS;
    use serde_json::json;

    fn sample() -> ContextVector {
        ContextVector::new("svc-A", "sync", "L6", "test", "manual", 10.0)
            .with_when(1_700_000_000)
            .with_source("gateway")
    }

    #[test]
    fn test_new_fills_factor_defaults() {
        let v = sample();
        for (key, default) in FACTOR_DEFAULTS {
            assert_eq!(v.metadata[key], json!(default), "factor {key}");
        }
        assert!(v.is_complete());
        assert_eq!(v.populated_dimensions(), 7);
    }

    #[test]
    fn test_validate_reports_missing() {
        let mut v = sample();
        v.who.clear();
        v.when = 0;
        let err = v.validate().unwrap_err();
        assert_eq!(
            err,
            ContextError::Validation {
                missing: vec!["who".to_string(), "when".to_string()]
            }
        );
    }

    #[test]
    fn test_map_round_trip() {
        let mut meta = Map::new();
        meta.insert("note".into(), json!("kept"));
        meta.insert("B".into(), json!(0.3));
        let v = sample().with_metadata(meta);

        let back = ContextVector::from_map(&v.to_map());
        assert_eq!(back, v);
        assert_eq!(back.metadata["note"], json!("kept"));
        assert_eq!(back.metadata["B"], json!(0.3));
    }

    #[test]
    fn test_to_map_omits_missing_source() {
        let v = ContextVector::new("a", "b", "c", "d", "e", 1.0);
        let map = v.to_map();
        assert!(!map.contains_key("source"));
        assert_eq!(map["where"], json!("c"));
    }

    #[test]
    fn test_from_map_tolerates_bad_fields() {
        let map = json!({
            "who": 42,
            "what": "sync",
            "when": "1700000100",
            "extent": "2.5",
            "metadata": "not a map"
        });
        let v = ContextVector::from_map(map.as_object().unwrap());
        assert_eq!(v.who, "");
        assert_eq!(v.what, "sync");
        assert_eq!(v.when, 1_700_000_100);
        assert_eq!(v.extent, 2.5);
        assert_eq!(v.source, None);
        assert_eq!(v.metadata.len(), FACTOR_DEFAULTS.len());
        assert!(!v.is_complete());
    }

    #[test]
    fn test_from_map_defaults_when_to_now() {
        let before = unix_now();
        let v = ContextVector::from_map(&Map::new());
        assert!(v.when >= before);
        assert_eq!(v.extent, DEFAULT_EXTENT);
    }

    #[test]
    fn test_merge_newer_operand_wins() {
        let mut a = ContextVector::new("alice", "write", "L1", "audit", "api", 3.0)
            .with_when(200);
        a.metadata.insert("shared".into(), json!("from-a"));
        let mut b = ContextVector::new("bob", "read", "L2", "debug", "cli", 1.0)
            .with_when(100);
        b.metadata.insert("shared".into(), json!("from-b"));
        b.metadata.insert("only_b".into(), json!(true));

        let merged = ContextVector::merge(&a, &b);
        assert_eq!(merged.who, "alice");
        assert_eq!(merged.what, "write");
        assert_eq!(merged.layer, "L1");
        assert_eq!(merged.when, 200);
        assert_eq!(merged.extent, 3.0);
        assert_eq!(merged.metadata["shared"], json!("from-a"));
        assert_eq!(merged.metadata["only_b"], json!(true));

        // Argument order does not matter when the timestamps differ.
        assert_eq!(ContextVector::merge(&b, &a), merged);
    }

    #[test]
    fn test_merge_tie_prefers_second() {
        let a = ContextVector::new("alice", "x", "L", "y", "z", 1.0).with_when(50);
        let b = ContextVector::new("bob", "x", "L", "y", "z", 1.0).with_when(50);
        assert_eq!(ContextVector::merge(&a, &b).who, "bob");
    }

    #[test]
    fn test_serde_uses_where_key() {
        let v = sample();
        let value = serde_json::to_value(&v).unwrap();
        assert_eq!(value["where"], json!("L6"));
        let back: ContextVector = serde_json::from_value(value).unwrap();
        assert_eq!(back, v);
    }
}
