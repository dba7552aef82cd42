//! Context vectors and the compression transform.

pub mod compression;
pub mod factors;
pub mod vector;

pub use compression::{
    compress, decompress, is_compressed, CompressionConfig, DenominatorPolicy,
};
pub use factors::CompressionFactors;
pub use vector::ContextVector;
