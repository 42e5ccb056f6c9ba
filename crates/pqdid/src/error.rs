//! Error types for pqdid.
//!
//! Encoding and signing failures are returned to the caller. The verifier
//! collects these same values into its report instead of returning early.
//! Private key material is never included in error messages.

/// Error kinds covering encoding, signing and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DidError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("No signing key available for the classical proof")]
    SignatureUnavailable,

    #[error("External signer failed: {0}")]
    SignerFailure(String),

    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    #[error("Canonical mismatch: stored {stored_len} bytes, recomputed {computed_len} bytes")]
    CanonicalMismatch {
        stored_len: usize,
        computed_len: usize,
    },

    #[error("Crypto verification failed: {0}")]
    CryptoVerificationFailure(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DidError {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput(_) => "EmptyInput",
            Self::UnsupportedValueType(_) => "UnsupportedValueType",
            Self::MalformedEncoding(_) => "MalformedEncoding",
            Self::InvalidKey(_) => "InvalidKey",
            Self::SignatureUnavailable => "SignatureUnavailable",
            Self::SignerFailure(_) => "SignerFailure",
            Self::StructuralViolation(_) => "StructuralViolation",
            Self::CanonicalMismatch { .. } => "CanonicalMismatch",
            Self::CryptoVerificationFailure(_) => "CryptoVerificationFailure",
            Self::Serialization(_) => "Serialization",
        }
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        Self::StructuralViolation(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEncoding(msg.into())
    }
}

impl From<serde_json::Error> for DidError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, DidError>;
