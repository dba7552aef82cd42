//! Identity signature providers stamped onto every trigger.
//!
//! The signer is passed to trigger construction explicitly so tests and glue
//! code can substitute a deterministic one.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::constants::ANONYMOUS_SIGNATURE;
use super::fingerprint::Fingerprint;
use crate::error::{ContextError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Source of the signature carried by a trigger.
pub trait Signer: Send + Sync {
    fn signature(&self) -> String;
}

impl<F> Signer for F
where
    F: Fn() -> String + Send + Sync,
{
    fn signature(&self) -> String {
        self()
    }
}

/// Signs with the UUID of a [`Fingerprint`].
#[derive(Debug, Clone, Default)]
pub struct FingerprintSigner {
    fingerprint: Fingerprint,
}

impl FingerprintSigner {
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self { fingerprint }
    }

    /// Signer with a deterministic fingerprint derived from `seed`.
    pub fn seeded(seed: &str) -> Self {
        Self::new(Fingerprint::generate(Some(seed)))
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

impl Signer for FingerprintSigner {
    fn signature(&self) -> String {
        self.fingerprint.uuid_str().to_string()
    }
}

/// Signs with `identity:hex(HMAC-SHA256(key, identity))`.
///
/// The MAC is computed once at construction.
#[derive(Debug, Clone)]
pub struct HmacSigner {
    signature: String,
}

impl HmacSigner {
    pub fn new(identity: &str, key: &[u8]) -> Result<Self> {
        let mut mac = HmacSha256::new_from_slice(key).map_err(|e| ContextError::Signing {
            message: e.to_string(),
        })?;
        mac.update(identity.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());
        Ok(Self {
            signature: format!("{identity}:{digest}"),
        })
    }

    /// Check a signature produced by a signer with the same key.
    pub fn verify(signature: &str, key: &[u8]) -> bool {
        let Some((identity, digest)) = signature.rsplit_once(':') else {
            return false;
        };
        let Ok(bytes) = hex::decode(digest) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
            return false;
        };
        mac.update(identity.as_bytes());
        mac.verify_slice(&bytes).is_ok()
    }
}

impl Signer for HmacSigner {
    fn signature(&self) -> String {
        self.signature.clone()
    }
}

/// Fixed signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSigner(pub String);

impl StaticSigner {
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }
}

impl Default for StaticSigner {
    fn default() -> Self {
        Self::new(ANONYMOUS_SIGNATURE)
    }
}

impl Signer for StaticSigner {
    fn signature(&self) -> String {
        self.0.clone()
    }
}
