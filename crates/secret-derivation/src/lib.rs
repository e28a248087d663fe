//! # Secret Derivation - Passphrase Secret Core
//!
//! Deterministically derives a 256-bit secret from a passphrase, a client
//! timestamp and a server-held secret.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | `policy` | Named phrase complexity rules |
//! | `validator` | Phrase and timestamp input checks |
//! | `deriver` | Seed construction and HMAC-SHA256 stretching |
//! | `secret` | Configuration values and the derived output type |
//!
//! ## Derivation
//!
//! ```text
//! seed    = phrase ‖ timestamp ‖ server_secret        (UTF-8, no delimiters)
//! d_1     = hex(HMAC-SHA256(server_secret, seed))
//! d_i     = hex(HMAC-SHA256(server_secret, d_{i-1}))  for i in 2..=rounds
//! secret  = d_rounds                                  (64 lowercase hex chars)
//! ```
//!
//! ## Usage
//!
//! ```
//! use secret_derivation::{PhrasePolicy, SecretDeriver, ServerSecret, StretchCount};
//!
//! let deriver = SecretDeriver::new(
//!     ServerSecret::new("test-secret").unwrap(),
//!     StretchCount::new(1).unwrap(),
//!     PhrasePolicy::standard(),
//! );
//! let secret = deriver.generate("Abc123!@", "1700000000000").unwrap();
//! assert_eq!(secret.as_str().len(), 64);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod deriver;
pub mod errors;
pub mod policy;
pub mod secret;
pub mod validator;

// Re-exports
pub use deriver::{derive, derive_with, SecretDeriver};
pub use errors::{ConfigError, DeriveError, GenerateError, ValidationError};
pub use policy::{PhrasePolicy, PhraseRule, DEFAULT_ALLOWED_SYMBOLS, DEFAULT_MIN_LENGTH};
pub use secret::{DerivedSecret, ServerSecret, StretchCount, DEFAULT_STRETCH_COUNT};
pub use validator::{validate, validate_phrase, validate_timestamp, TIMESTAMP_DIGITS};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
