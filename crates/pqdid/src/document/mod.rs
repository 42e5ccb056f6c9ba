//! Identity documents: the core object, the JSON model and assembly.

pub mod core;
pub mod generator;
pub mod model;

pub use self::core::{CoreKey, CoreObject, CoreService};
pub use generator::{create, DocumentBuilder};
pub use model::{IdentityDocument, Service, UpdatePolicy, VerificationMethod};
