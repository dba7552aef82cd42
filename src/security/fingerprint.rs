//! Fingerprint identity for trigger producers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::constants::CTXMATRIX_NAMESPACE;

/// Stable identity of a component that emits triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    /// String representation of the UUID.
    uuid_str: String,
    /// Creation timestamp.
    created_at: DateTime<Utc>,
}

impl Fingerprint {
    /// Generate a fingerprint. A seed yields the same UUID every time.
    pub fn generate(seed: Option<&str>) -> Self {
        let uuid = match seed {
            Some(s) => Uuid::new_v5(&CTXMATRIX_NAMESPACE, s.as_bytes()),
            None => Uuid::new_v4(),
        };
        Self {
            uuid_str: uuid.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Get the UUID string.
    pub fn uuid_str(&self) -> &str {
        &self.uuid_str
    }

    /// Get the creation timestamp.
    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::generate(None)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uuid_str)
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.uuid_str == other.uuid_str
    }
}

impl Eq for Fingerprint {}

impl std::hash::Hash for Fingerprint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uuid_str.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_fingerprint_is_deterministic() {
        let a = Fingerprint::generate(Some("gateway"));
        let b = Fingerprint::generate(Some("gateway"));
        assert_eq!(a, b);
        assert_ne!(a, Fingerprint::generate(Some("worker")));
    }

    #[test]
    fn test_random_fingerprints_differ() {
        let a = Fingerprint::default();
        let b = Fingerprint::default();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.uuid_str());
        assert!(Uuid::parse_str(a.uuid_str()).is_ok());
    }

    #[test]
    fn test_created_at_is_generation_time() {
        let before = Utc::now();
        let fingerprint = Fingerprint::generate(Some("gateway"));
        let after = Utc::now();
        assert!(*fingerprint.created_at() >= before);
        assert!(*fingerprint.created_at() <= after);
    }
}
