//! # Secret Values
//!
//! - [`ServerSecret`]: HMAC key held by the server. Never empty, redacted in
//!   `Debug`, wiped on drop.
//! - [`StretchCount`]: number of HMAC rounds. Never zero.
//! - [`DerivedSecret`]: 64-char lowercase hex output.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use zeroize::Zeroize;

/// Default number of HMAC rounds.
pub const DEFAULT_STRETCH_COUNT: u32 = 10_000;

/// Server-held HMAC key.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct ServerSecret(String);

impl ServerSecret {
    /// Wrap a secret, rejecting the empty string.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self(secret))
    }

    /// Secret bytes used as the HMAC key.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSecret(<redacted>)")
    }
}

/// Number of HMAC invocations per derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StretchCount(NonZeroU32);

impl StretchCount {
    /// Wrap a round count, rejecting zero.
    pub fn new(rounds: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(rounds)
            .map(Self)
            .ok_or(ConfigError::ZeroStretchCount)
    }

    /// Round count.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for StretchCount {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_STRETCH_COUNT).unwrap_or(NonZeroU32::MIN))
    }
}

impl TryFrom<u32> for StretchCount {
    type Error = ConfigError;

    fn try_from(rounds: u32) -> Result<Self, Self::Error> {
        Self::new(rounds)
    }
}

impl From<StretchCount> for u32 {
    fn from(count: StretchCount) -> Self {
        count.get()
    }
}

impl fmt::Display for StretchCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final derivation output: lowercase hex of a SHA-256 sized HMAC tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedSecret(String);

impl DerivedSecret {
    /// Length of the hex encoding.
    pub const HEX_LEN: usize = 64;

    pub(crate) fn from_hex(hex: String) -> Self {
        debug_assert_eq!(hex.len(), Self::HEX_LEN);
        Self(hex)
    }

    /// Hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the hex string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DerivedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
