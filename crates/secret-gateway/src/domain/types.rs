//! Request and response bodies.

use secret_derivation::DerivedSecret;
use serde::{Deserialize, Serialize};

/// `POST /generate-secret` body. Absent fields are rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSecretRequest {
    /// Passphrase
    pub phrase: Option<String>,
    /// 13-digit millisecond epoch timestamp
    pub timestamp: Option<String>,
}

/// Successful derivation, echoing the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateSecretResponse {
    /// 64 lowercase hex chars
    pub secret: DerivedSecret,
    /// Echoed passphrase
    pub phrase: String,
    /// Echoed timestamp
    pub timestamp: String,
}
