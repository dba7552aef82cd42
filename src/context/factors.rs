//! Named compression factors carried in a vector's metadata.
//!
//! Seven single-letter keys live alongside free-form annotations:
//!
//! | key | meaning | default |
//! |-----|---------|---------|
//! | `B` | base weight | 0.8 |
//! | `V` | variance weight | 0.7 |
//! | `I` | intent weight | 0.9 |
//! | `G` | gain | 1.2 |
//! | `F` | feedback | 0.6 |
//! | `E` | decay exponent | 0.5 |
//! | `T` | creation timestamp (Unix seconds, 0 = unknown) | 0.0 |

use serde_json::{Map, Value};

pub const FACTOR_B: &str = "B";
pub const FACTOR_V: &str = "V";
pub const FACTOR_I: &str = "I";
pub const FACTOR_G: &str = "G";
pub const FACTOR_F: &str = "F";
pub const FACTOR_E: &str = "E";
pub const FACTOR_T: &str = "T";

pub const DEFAULT_B: f64 = 0.8;
pub const DEFAULT_V: f64 = 0.7;
pub const DEFAULT_I: f64 = 0.9;
pub const DEFAULT_G: f64 = 1.2;
pub const DEFAULT_F: f64 = 0.6;
pub const DEFAULT_E: f64 = 0.5;
pub const DEFAULT_T: f64 = 0.0;

/// Every factor key with its default, in declaration order.
pub const FACTOR_DEFAULTS: [(&str, f64); 7] = [
    (FACTOR_B, DEFAULT_B),
    (FACTOR_V, DEFAULT_V),
    (FACTOR_I, DEFAULT_I),
    (FACTOR_G, DEFAULT_G),
    (FACTOR_F, DEFAULT_F),
    (FACTOR_E, DEFAULT_E),
    (FACTOR_T, DEFAULT_T),
];

/// Resolved factor set used by the compression transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionFactors {
    pub b: f64,
    pub v: f64,
    pub i: f64,
    pub g: f64,
    pub f: f64,
    pub e: f64,
    pub t: f64,
}

impl Default for CompressionFactors {
    fn default() -> Self {
        Self {
            b: DEFAULT_B,
            v: DEFAULT_V,
            i: DEFAULT_I,
            g: DEFAULT_G,
            f: DEFAULT_F,
            e: DEFAULT_E,
            t: DEFAULT_T,
        }
    }
}

impl CompressionFactors {
    /// Read factors from metadata; absent or non-numeric keys fall back to
    /// their defaults.
    pub fn from_metadata(metadata: &Map<String, Value>) -> Self {
        let read = |key: &str, default: f64| {
            metadata.get(key).and_then(numeric).unwrap_or(default)
        };
        Self {
            b: read(FACTOR_B, DEFAULT_B),
            v: read(FACTOR_V, DEFAULT_V),
            i: read(FACTOR_I, DEFAULT_I),
            g: read(FACTOR_G, DEFAULT_G),
            f: read(FACTOR_F, DEFAULT_F),
            e: read(FACTOR_E, DEFAULT_E),
            t: read(FACTOR_T, DEFAULT_T),
        }
    }

    /// Write all seven factors into `metadata`, overwriting existing keys.
    pub fn write_to(&self, metadata: &mut Map<String, Value>) {
        for (key, value) in [
            (FACTOR_B, self.b),
            (FACTOR_V, self.v),
            (FACTOR_I, self.i),
            (FACTOR_G, self.g),
            (FACTOR_F, self.f),
            (FACTOR_E, self.e),
            (FACTOR_T, self.t),
        ] {
            metadata.insert(key.to_string(), number(value));
        }
    }
}

/// Insert defaults for any factor key missing from `metadata`, or present
/// with a non-numeric value. Existing numeric values are left alone.
pub fn fill_factor_defaults(metadata: &mut Map<String, Value>) {
    for (key, default) in FACTOR_DEFAULTS {
        let usable = metadata.get(key).and_then(numeric).is_some();
        if !usable {
            metadata.insert(key.to_string(), number(default));
        }
    }
}

/// Lenient numeric read: JSON numbers and numeric strings.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// JSON number for a finite float, `null` otherwise.
pub(crate) fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_empty_metadata() {
        let factors = CompressionFactors::from_metadata(&Map::new());
        assert_eq!(factors, CompressionFactors::default());
    }

    #[test]
    fn test_reads_numbers_and_numeric_strings() {
        let mut meta = Map::new();
        meta.insert("B".into(), json!(0.25));
        meta.insert("E".into(), json!("1.5"));
        meta.insert("G".into(), json!("not a number"));
        let factors = CompressionFactors::from_metadata(&meta);
        assert_eq!(factors.b, 0.25);
        assert_eq!(factors.e, 1.5);
        assert_eq!(factors.g, DEFAULT_G);
    }

    #[test]
    fn test_fill_keeps_existing_values() {
        let mut meta = Map::new();
        meta.insert("V".into(), json!(0.1));
        meta.insert("I".into(), json!(true));
        meta.insert("note".into(), json!("free-form"));
        fill_factor_defaults(&mut meta);

        assert_eq!(meta.len(), 8);
        assert_eq!(meta["V"], json!(0.1));
        assert_eq!(meta["I"], json!(DEFAULT_I));
        assert_eq!(meta["T"], json!(0.0));
        assert_eq!(meta["note"], json!("free-form"));
    }

    #[test]
    fn test_write_to_overwrites() {
        let mut meta = Map::new();
        meta.insert("B".into(), json!(9.0));
        let factors = CompressionFactors {
            b: 0.5,
            ..CompressionFactors::default()
        };
        factors.write_to(&mut meta);
        assert_eq!(meta["B"], json!(0.5));
        assert_eq!(meta.len(), 7);
    }
}
