//! Error types for obramo-session — Railway Programming
//!
//! All fallible operations return `Result<T, SessionError>`.
//! The session core itself never fails outward: fetch failures are folded
//! into the published snapshot as a `SessionIssue` instead.

use thiserror::Error;

/// Unified error type for session, identity and profile operations
#[derive(Error, Debug)]
pub enum SessionError {
    // ─── Identity Errors ───

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password too weak: {0}")]
    PasswordTooWeak(String),

    #[error("No principal is signed in")]
    NotSignedIn,

    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    // ─── Profile Store Errors ───

    #[error("Profile store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Profile request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed profile document for {principal_id}: {reason}")]
    MalformedProfile { principal_id: String, reason: String },

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    // ─── Actor Errors ───

    #[error("Actor unavailable: {0}")]
    ActorUnavailable(String),

    // ─── Infrastructure Errors ───

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Transient failures that a later attempt may not hit
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::RequestFailed(_))
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
