//! Deterministic, lossy extent compression and its metadata-guided restore.
//!
//! ```text
//! alignment  = (B + V*I) * exp(-t*E)
//! extent'    = extent * B * I * (1 - entropy / log2(1 + V)) * (G + F)
//!              / (E*t + 0.3*entropy + alignment)
//! ```
//!
//! The formula is not invertible. [`decompress`] restores the extent from the
//! `originalExtent` recorded by [`compress`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::factors::{number, numeric, CompressionFactors};
use super::vector::ContextVector;
use crate::error::{ContextError, Result};

pub const META_COMPRESSED: &str = "compressed";
pub const META_ORIGINAL_EXTENT: &str = "originalExtent";
pub const META_COMPRESSION_RATIO: &str = "compressionRatio";
pub const META_ENTROPY: &str = "entropy";
pub const META_ALIGNMENT: &str = "alignment";

/// Metadata keys written by [`compress`] and removed by [`decompress`].
pub const DERIVED_KEYS: [&str; 5] = [
    META_COMPRESSED,
    META_ORIGINAL_EXTENT,
    META_COMPRESSION_RATIO,
    META_ENTROPY,
    META_ALIGNMENT,
];

pub const MIN_ENTROPY: f64 = 0.1;
pub const MAX_ENTROPY: f64 = 0.9;

/// Metadata entries beyond this count stop raising entropy.
const ENTROPY_METADATA_CAP: usize = 10;

/// How to treat a denominator whose magnitude falls below
/// [`CompressionConfig::min_denominator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenominatorPolicy {
    /// Return [`ContextError::Computation`].
    #[default]
    Reject,
    /// Substitute `±min_denominator`.
    Clamp,
}

impl std::str::FromStr for DenominatorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            other => Err(format!("unknown denominator policy '{other}'")),
        }
    }
}

/// Numeric knobs of the transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub denominator_policy: DenominatorPolicy,
    pub min_denominator: f64,
    /// Elapsed seconds that normalize to `t = 1`.
    pub time_window_secs: f64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            denominator_policy: DenominatorPolicy::Reject,
            min_denominator: 1e-9,
            time_window_secs: 86_400.0,
        }
    }
}

/// Entropy in `[0.1, 0.9]`, rising with populated dimensions and metadata size.
pub fn entropy(vector: &ContextVector) -> f64 {
    let populated = vector.populated_dimensions() as f64 / 7.0;
    let meta = vector.metadata.len().min(ENTROPY_METADATA_CAP) as f64
        / ENTROPY_METADATA_CAP as f64;
    (0.5 * populated + 0.3 * meta).clamp(MIN_ENTROPY, MAX_ENTROPY)
}

/// Normalized elapsed time between creation (factor `T`) and `when`.
///
/// Zero when the creation time is unknown or not earlier than `when`;
/// saturates at 1 after one window.
pub fn normalized_elapsed(vector: &ContextVector, created_at: f64, window_secs: f64) -> f64 {
    if created_at <= 0.0 || window_secs <= 0.0 {
        return 0.0;
    }
    let elapsed = vector.when as f64 - created_at;
    if elapsed <= 0.0 {
        return 0.0;
    }
    (elapsed / window_secs).min(1.0)
}

/// Compress the vector's extent.
///
/// Returns a copy with the new extent and `compressed`, `originalExtent`,
/// `compressionRatio`, `entropy` and `alignment` recorded in metadata. A vector
/// that is already compressed keeps its first `originalExtent`.
pub fn compress(vector: &ContextVector, config: &CompressionConfig) -> Result<ContextVector> {
    let factors = CompressionFactors::from_metadata(&vector.metadata);
    let entropy = entropy(vector);
    let t = normalized_elapsed(vector, factors.t, config.time_window_secs);

    let alignment = (factors.b + factors.v * factors.i) * (-t * factors.e).exp();
    let numerator = vector.extent
        * factors.b
        * factors.i
        * (1.0 - entropy / (1.0 + factors.v).log2())
        * (factors.g + factors.f);
    let denominator = checked_denominator(
        factors.e * t + 0.3 * entropy + alignment,
        config,
    )?;

    let compressed = numerator / denominator;
    if !compressed.is_finite() {
        return Err(ContextError::Computation {
            message: format!(
                "compressed extent is not finite (numerator {numerator}, denominator {denominator})"
            ),
        });
    }

    let original = if is_compressed(vector) {
        vector
            .metadata
            .get(META_ORIGINAL_EXTENT)
            .and_then(numeric)
            .unwrap_or(vector.extent)
    } else {
        vector.extent
    };
    let ratio = if original == 0.0 {
        0.0
    } else {
        compressed / original
    };

    let mut out = vector.clone();
    out.extent = compressed;
    out.metadata
        .insert(META_COMPRESSED.to_string(), Value::Bool(true));
    out.metadata
        .insert(META_ORIGINAL_EXTENT.to_string(), number(original));
    out.metadata
        .insert(META_COMPRESSION_RATIO.to_string(), number(ratio));
    out.metadata
        .insert(META_ENTROPY.to_string(), number(entropy));
    out.metadata
        .insert(META_ALIGNMENT.to_string(), number(alignment));

    log::debug!(
        "compressed context '{}': extent {} -> {} (entropy {:.3}, alignment {:.3})",
        vector.what,
        vector.extent,
        compressed,
        entropy,
        alignment
    );
    Ok(out)
}

/// Undo [`compress`] using the recorded metadata.
///
/// A vector without the `compressed` flag is returned unchanged. Otherwise the
/// extent is restored from `originalExtent` (left as is if that key is gone)
/// and all derived keys are stripped.
pub fn decompress(vector: &ContextVector) -> ContextVector {
    let mut out = vector.clone();
    if !is_compressed(vector) {
        return out;
    }
    if let Some(original) = vector.metadata.get(META_ORIGINAL_EXTENT).and_then(numeric) {
        out.extent = original;
    }
    for key in DERIVED_KEYS {
        out.metadata.remove(key);
    }
    out
}

/// True when the vector carries the `compressed` marker.
pub fn is_compressed(vector: &ContextVector) -> bool {
    match vector.metadata.get(META_COMPRESSED) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn checked_denominator(denominator: f64, config: &CompressionConfig) -> Result<f64> {
    if !denominator.is_finite() {
        return Err(ContextError::Computation {
            message: format!("denominator is not finite ({denominator})"),
        });
    }
    if denominator.abs() >= config.min_denominator {
        return Ok(denominator);
    }
    match config.denominator_policy {
        DenominatorPolicy::Reject => Err(ContextError::Computation {
            message: format!(
                "denominator {denominator} is below the minimum magnitude {}",
                config.min_denominator
            ),
        }),
        DenominatorPolicy::Clamp => {
            log::warn!(
                "clamping compression denominator {} to {}",
                denominator,
                config.min_denominator
            );
            if denominator < 0.0 {
                Ok(-config.min_denominator)
            } else {
                Ok(config.min_denominator)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GOLDEN: &str = include_str!("testdata/compress_default.json");
    const TOLERANCE: f64 = 1e-12;

    fn golden_vector() -> ContextVector {
        ContextVector::new("svc-A", "sync", "L6", "test", "manual", 10.0).with_when(1_700_000_000)
    }

    #[test]
    fn test_golden_default_factors() {
        let golden: Value = serde_json::from_str(GOLDEN).unwrap();
        let out = compress(&golden_vector(), &CompressionConfig::default()).unwrap();

        assert_eq!(out.metadata[META_COMPRESSED], json!(true));
        assert!(out.extent < 10.0);
        let expect = |key: &str| golden[key].as_f64().unwrap();
        assert!((out.extent - expect("extent")).abs() < TOLERANCE);
        assert!(
            (out.metadata[META_ENTROPY].as_f64().unwrap() - expect("entropy")).abs() < TOLERANCE
        );
        assert!(
            (out.metadata[META_ALIGNMENT].as_f64().unwrap() - expect("alignment")).abs()
                < TOLERANCE
        );
        assert!(
            (out.metadata[META_COMPRESSION_RATIO].as_f64().unwrap()
                - expect("compressionRatio"))
            .abs()
                < TOLERANCE
        );
        assert_eq!(out.metadata[META_ORIGINAL_EXTENT], json!(10.0));
    }

    #[test]
    fn test_compress_does_not_touch_input() {
        let v = golden_vector();
        let _ = compress(&v, &CompressionConfig::default()).unwrap();
        assert_eq!(v.extent, 10.0);
        assert!(!is_compressed(&v));
    }

    #[test]
    fn test_decompress_restores_extent() {
        let v = golden_vector();
        let restored = decompress(&compress(&v, &CompressionConfig::default()).unwrap());
        assert!((restored.extent - v.extent).abs() < TOLERANCE);
        assert_eq!(restored.metadata, v.metadata);
        assert_eq!(restored, v);
    }

    #[test]
    fn test_decompress_idempotent() {
        let once = decompress(&compress(&golden_vector(), &CompressionConfig::default()).unwrap());
        assert_eq!(decompress(&once), once);
    }

    #[test]
    fn test_decompress_uncompressed_is_noop() {
        let mut v = golden_vector();
        v.metadata.insert(META_ENTROPY.into(), json!(0.5));
        assert_eq!(decompress(&v), v);
    }

    #[test]
    fn test_recompress_keeps_first_original() {
        let config = CompressionConfig::default();
        let twice = compress(&compress(&golden_vector(), &config).unwrap(), &config).unwrap();
        assert_eq!(twice.metadata[META_ORIGINAL_EXTENT], json!(10.0));
        let ratio = twice.metadata[META_COMPRESSION_RATIO].as_f64().unwrap();
        assert!((ratio - twice.extent / 10.0).abs() < TOLERANCE);
        assert_eq!(decompress(&twice).extent, 10.0);
    }

    #[test]
    fn test_entropy_bounds() {
        let empty = ContextVector::from_map(&serde_json::Map::new())
            .with_metadata(serde_json::Map::new());
        let mut sparse = empty.clone();
        sparse.when = 0;
        sparse.metadata.clear();
        assert_eq!(entropy(&sparse), MIN_ENTROPY);

        let mut dense = golden_vector();
        for i in 0..20 {
            dense.metadata.insert(format!("k{i}"), json!(i));
        }
        assert!(entropy(&dense) <= MAX_ENTROPY);
        assert!(entropy(&dense) > entropy(&golden_vector()));
    }

    #[test]
    fn test_elapsed_time_lowers_alignment() {
        let fresh = golden_vector();
        let mut aged = golden_vector();
        aged.metadata
            .insert("T".into(), json!(1_700_000_000 - 43_200));

        let config = CompressionConfig::default();
        assert_eq!(normalized_elapsed(&fresh, 0.0, 86_400.0), 0.0);
        assert_eq!(normalized_elapsed(&aged, 1_699_956_800.0, 86_400.0), 0.5);

        let fresh_out = compress(&fresh, &config).unwrap();
        let aged_out = compress(&aged, &config).unwrap();
        assert!(
            aged_out.metadata[META_ALIGNMENT].as_f64().unwrap()
                < fresh_out.metadata[META_ALIGNMENT].as_f64().unwrap()
        );
    }

    #[test]
    fn test_elapsed_saturates() {
        let v = golden_vector();
        assert_eq!(normalized_elapsed(&v, 1.0, 86_400.0), 1.0);
        assert_eq!(normalized_elapsed(&v, 1_800_000_000.0, 86_400.0), 0.0);
    }

    fn degenerate_vector() -> ContextVector {
        // B + V*I = 0 and t = 0: the denominator collapses to 0.3 * entropy.
        let mut v = golden_vector();
        v.metadata.insert("B".into(), json!(-0.63));
        v.metadata.insert("V".into(), json!(0.7));
        v.metadata.insert("I".into(), json!(0.9));
        v
    }

    #[test]
    fn test_near_zero_denominator_rejected() {
        let config = CompressionConfig {
            min_denominator: 1.0,
            ..CompressionConfig::default()
        };
        let err = compress(&degenerate_vector(), &config).unwrap_err();
        assert!(matches!(err, ContextError::Computation { .. }));
    }

    #[test]
    fn test_near_zero_denominator_clamped() {
        let config = CompressionConfig {
            denominator_policy: DenominatorPolicy::Clamp,
            min_denominator: 1.0,
            ..CompressionConfig::default()
        };
        let out = compress(&degenerate_vector(), &config).unwrap();
        assert!(out.extent.is_finite());
        assert!(is_compressed(&out));
    }

    #[test]
    fn test_zero_variance_is_not_finite() {
        let mut v = golden_vector();
        v.metadata.insert("V".into(), json!(0.0));
        let err = compress(&v, &CompressionConfig::default()).unwrap_err();
        assert!(matches!(err, ContextError::Computation { .. }));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Clamp".parse::<DenominatorPolicy>(), Ok(DenominatorPolicy::Clamp));
        assert_eq!(" reject ".parse::<DenominatorPolicy>(), Ok(DenominatorPolicy::Reject));
        assert!("wrap".parse::<DenominatorPolicy>().is_err());
    }
}
