//! Encoding primitives: multibase text encodings and unsigned varints.

pub mod multibase;
pub mod varint;

pub use multibase::Base;
