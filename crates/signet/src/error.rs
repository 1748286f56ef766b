//! Error types for the Signet SDK.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material is never included in error messages.
//!
//! Local precondition failures (`ParamMissing`, `ParamInvalid`,
//! `OrgKeyNotSet`, `InvalidPreviousSign`) are raised before any network
//! call. `RegistryRejected` is an expected, non-fatal outcome — a lost
//! race, a stale key, a conflicting namespace — that callers handle as an
//! ordinary branch. Nothing is retried automatically.

use serde_json::Value;

/// Signet error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum SignetError {
    #[error("Missing parameter: {0}")]
    ParamMissing(String),

    #[error("Invalid parameter: {0}")]
    ParamInvalid(String),

    #[error("Organization keys not set")]
    OrgKeyNotSet,

    #[error("Invalid previous signature: entity has no accepted mutation")]
    InvalidPreviousSign,

    #[error("Registry rejected the request ({status}): {message}")]
    RegistryRejected { status: u16, message: String },

    #[error("Key decode failed: {0}")]
    DecodeError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SignetError {
    /// Build a `RegistryRejected` from a non-200 response, pulling the
    /// registry's error message out of the response body when present.
    pub fn registry(status: u16, data: &Value) -> Self {
        let message = data
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| data.to_string());
        Self::RegistryRejected { status, message }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SignetError>;
