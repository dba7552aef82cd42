//! Security constants.

use uuid::Uuid;

/// Namespace for deterministic (seeded) fingerprint UUIDs.
pub const CTXMATRIX_NAMESPACE: Uuid = Uuid::from_u128(0x6d1c_2e4a_8b3f_4c5d_9e0a_1b2c_3d4e_5f60);

/// Signature returned by signers that have nothing better to offer.
pub const ANONYMOUS_SIGNATURE: &str = "anonymous";
