//! Derivation error types.

use thiserror::Error;

/// Client input rejected before derivation runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Phrase missing or not satisfying the phrase policy
    #[error("{0}")]
    InvalidPhrase(String),

    /// Timestamp missing or not a 13-digit millisecond epoch value
    #[error("{0}")]
    InvalidTimestamp(String),
}

impl ValidationError {
    /// Name of the request field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidPhrase(_) => "phrase",
            ValidationError::InvalidTimestamp(_) => "timestamp",
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            ValidationError::InvalidPhrase(msg) | ValidationError::InvalidTimestamp(msg) => msg,
        }
    }
}

/// Derivation refused because its configuration inputs are unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    /// Server secret is empty; an empty HMAC key is publicly known
    #[error("server secret is empty")]
    EmptySecret,

    /// Stretch count is zero
    #[error("stretch count must be at least 1")]
    ZeroRounds,

    /// HMAC rejected the key
    #[error("invalid HMAC key length")]
    InvalidKey,

    /// Digest could not be hex encoded
    #[error("digest encoding failed")]
    Encoding,
}

/// Failure of a validate-then-derive call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// Client input rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Derivation failed
    #[error(transparent)]
    Derive(#[from] DeriveError),
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Server secret is missing or empty
    #[error("server secret must not be empty")]
    EmptySecret,

    /// Stretch count is zero
    #[error("stretch count must be a positive integer")]
    ZeroStretchCount,

    /// Phrase policy minimum length is zero
    #[error("phrase minimum length must be a positive integer")]
    ZeroMinLength,

    /// Unknown phrase policy preset name
    #[error("unknown phrase policy '{0}' (expected 'standard' or 'mixed-case')")]
    UnknownPolicy(String),
}
