//! Error taxonomy for the forge transport layer.

use thiserror::Error;

/// Errors surfaced by [`crate::ForgeClient`] and [`crate::CredentialBroker`].
///
/// Each variant is a first-class taxonomy member (see the error handling
/// design): recoverable 4xx conditions are distinguished from transport
/// failures so callers can decide whether to degrade gracefully or bubble
/// up.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Neither an app signing key nor a fallback token is configured.
    #[error("no forge credentials configured (need GITHUB_APP_ID+GITHUB_APP_PRIVATE_KEY or GITHUB_TOKEN)")]
    AuthUnconfigured,

    /// The requested resource does not exist on the forge.
    #[error("not found: {0}")]
    NotFound(String),

    /// A ref already exists or a compare-and-swap update was stale.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Credentials were rejected by the forge.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials were accepted but lack permission for this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request body failed the forge's validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A 5xx response or transport failure persisted past the retry budget.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// JWT signing failure while minting an app-level assertion.
    #[error("credential signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Result alias for forge operations.
pub type ForgeResult<T> = Result<T, ForgeError>;
