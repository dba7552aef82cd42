//! Identity and signatures for trigger producers.

pub mod constants;
pub mod fingerprint;
pub mod signer;

pub use fingerprint::Fingerprint;
pub use signer::{FingerprintSigner, HmacSigner, Signer, StaticSigner};
