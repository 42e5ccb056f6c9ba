//! Canonical encodings.
//!
//! Two independent canonical forms are defined:
//! - `cbor`: the binary form of the core object, hashed into its CID
//! - `json`: the text form of the full identity document
//!
//! Both must be bit-exact across processes and platforms. A divergence in
//! either one breaks signature verification or hash equality.

pub mod cbor;
pub mod json;
pub mod value;

pub use json::{canonicalize, canonicalize_serializable};
pub use value::CoreValue;
