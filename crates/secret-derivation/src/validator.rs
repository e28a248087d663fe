//! Input validation for derivation requests.
//!
//! The phrase is checked first; the first failing field is reported.
//! Timestamps are syntax-checked only. There is no comparison against the
//! current time, so validation stays a pure function of its inputs.

use crate::errors::ValidationError;
use crate::policy::PhrasePolicy;

/// Number of digits in a millisecond epoch timestamp.
pub const TIMESTAMP_DIGITS: usize = 13;

/// Validate both request fields against `policy`.
pub fn validate(
    phrase: Option<&str>,
    timestamp: Option<&str>,
    policy: &PhrasePolicy,
) -> Result<(), ValidationError> {
    validate_phrase(phrase, policy)?;
    validate_timestamp(timestamp)
}

/// Validate the phrase. `None` and `""` are rejected.
pub fn validate_phrase(phrase: Option<&str>, policy: &PhrasePolicy) -> Result<(), ValidationError> {
    match phrase {
        Some(p) if !p.is_empty() && policy.accepts(p) => Ok(()),
        _ => Err(ValidationError::InvalidPhrase(format!(
            "Invalid passphrase. {}",
            policy.describe()
        ))),
    }
}

/// Validate the timestamp: exactly [`TIMESTAMP_DIGITS`] ASCII digits.
pub fn validate_timestamp(timestamp: Option<&str>) -> Result<(), ValidationError> {
    match timestamp {
        Some(t) if t.len() == TIMESTAMP_DIGITS && t.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err(ValidationError::InvalidTimestamp(format!(
            "Invalid timestamp. It should be a {}-digit Unix timestamp in milliseconds.",
            TIMESTAMP_DIGITS
        ))),
    }
}
