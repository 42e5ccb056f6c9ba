//! The two anchoring rails.
//!
//! A document is accepted only when both verify: the attestation binds the
//! post-quantum root key to the exact core bytes, the proof binds the
//! classical key to the core's CID.

pub mod attestation;
pub mod proof;

pub use attestation::Attestation;
pub use proof::{CompactJws, Proof};
