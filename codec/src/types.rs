//! Codec implementations for common types.

mod primitives;
pub mod vec;
