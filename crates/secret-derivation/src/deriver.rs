//! # Deriver
//!
//! Seed construction and HMAC-SHA256 stretching.
//!
//! ## Contract
//!
//! - Seed is `phrase ‖ timestamp ‖ server_secret` as UTF-8, no delimiters.
//!   Reordering the fields changes every derived secret.
//! - Round 1 MACs the seed; every later round MACs the lowercase hex text of the
//!   previous tag. The key is the server secret in every round.
//! - Total HMAC invocations equal the stretch count.

use crate::errors::{DeriveError, GenerateError};
use crate::policy::PhrasePolicy;
use crate::secret::{DerivedSecret, ServerSecret, StretchCount};
use crate::validator;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Derive from raw configuration values.
///
/// Fails on an empty `server_secret` or a zero `stretch_count` instead of
/// hashing with a publicly known key.
pub fn derive(
    phrase: &str,
    timestamp: &str,
    server_secret: &str,
    stretch_count: u32,
) -> Result<DerivedSecret, DeriveError> {
    if server_secret.is_empty() {
        return Err(DeriveError::EmptySecret);
    }
    if stretch_count == 0 {
        return Err(DeriveError::ZeroRounds);
    }
    stretch(
        &[phrase.as_bytes(), timestamp.as_bytes(), server_secret.as_bytes()],
        server_secret.as_bytes(),
        stretch_count,
    )
}

/// Derive from validated configuration values.
pub fn derive_with(
    phrase: &str,
    timestamp: &str,
    secret: &ServerSecret,
    rounds: StretchCount,
) -> Result<DerivedSecret, DeriveError> {
    stretch(
        &[phrase.as_bytes(), timestamp.as_bytes(), secret.as_bytes()],
        secret.as_bytes(),
        rounds.get(),
    )
}

fn stretch(seed: &[&[u8]], key: &[u8], rounds: u32) -> Result<DerivedSecret, DeriveError> {
    // Key schedule computed once, cloned per round.
    let keyed = HmacSha256::new_from_slice(key).map_err(|_| DeriveError::InvalidKey)?;

    let mut mac = keyed.clone();
    for part in seed {
        mac.update(part);
    }

    let mut digest_hex = [0u8; DerivedSecret::HEX_LEN];
    hex::encode_to_slice(mac.finalize().into_bytes(), &mut digest_hex)
        .map_err(|_| DeriveError::Encoding)?;

    for _ in 1..rounds {
        let mut mac = keyed.clone();
        mac.update(&digest_hex);
        hex::encode_to_slice(mac.finalize().into_bytes(), &mut digest_hex)
            .map_err(|_| DeriveError::Encoding)?;
    }

    let hex = String::from_utf8(digest_hex.to_vec()).map_err(|_| DeriveError::Encoding)?;
    Ok(DerivedSecret::from_hex(hex))
}

/// Validator and deriver bound to the process configuration.
///
/// Built once at startup and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct SecretDeriver {
    secret: ServerSecret,
    rounds: StretchCount,
    policy: PhrasePolicy,
}

impl SecretDeriver {
    /// Create a deriver.
    pub fn new(secret: ServerSecret, rounds: StretchCount, policy: PhrasePolicy) -> Self {
        Self {
            secret,
            rounds,
            policy,
        }
    }

    /// Configured round count.
    pub fn rounds(&self) -> StretchCount {
        self.rounds
    }

    /// Active phrase policy.
    pub fn policy(&self) -> &PhrasePolicy {
        &self.policy
    }

    /// Validate the request fields.
    pub fn validate(
        &self,
        phrase: Option<&str>,
        timestamp: Option<&str>,
    ) -> Result<(), crate::ValidationError> {
        validator::validate(phrase, timestamp, &self.policy)
    }

    /// Derive without validation.
    pub fn derive(&self, phrase: &str, timestamp: &str) -> Result<DerivedSecret, DeriveError> {
        derive_with(phrase, timestamp, &self.secret, self.rounds)
    }

    /// Validate, then derive.
    pub fn generate(&self, phrase: &str, timestamp: &str) -> Result<DerivedSecret, GenerateError> {
        self.validate(Some(phrase), Some(timestamp))?;
        Ok(self.derive(phrase, timestamp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    const PHRASE: &str = "Abc123!@";
    const TS: &str = "1700000000000";
    const SECRET: &str = "test-secret";

    // HMAC-SHA256 keyed by "test-secret" over "Abc123!@1700000000000test-secret"
    const ONE_ROUND: &str = "a2dc58d08eed2892c81a3e0e827ef0de025159fc2080c1619d5a68e92e738bcb";
    const TWO_ROUNDS: &str = "a7c7308c6581f3df6d295ad568844634303fa6bb834e4d16006a3286e0a28770";
    const DEFAULT_ROUNDS: &str = "47be6224b8a0150a2a9fff08fafc779fc062442c379b8df8a0debc555cebcfec";

    fn hmac_hex(key: &[u8], msg: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(msg);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_single_round_fixture() {
        let out = derive(PHRASE, TS, SECRET, 1).unwrap();
        assert_eq!(out.as_str(), ONE_ROUND);
    }

    #[test]
    fn test_single_round_is_one_hmac_over_seed() {
        let expected = hmac_hex(SECRET.as_bytes(), b"Abc123!@1700000000000test-secret");
        assert_eq!(derive(PHRASE, TS, SECRET, 1).unwrap().as_str(), expected);
    }

    #[test]
    fn test_two_round_fixture() {
        assert_eq!(derive(PHRASE, TS, SECRET, 2).unwrap().as_str(), TWO_ROUNDS);
    }

    #[test]
    fn test_default_round_fixture() {
        let out = derive(PHRASE, TS, SECRET, crate::DEFAULT_STRETCH_COUNT).unwrap();
        assert_eq!(out.as_str(), DEFAULT_ROUNDS);
    }

    #[test]
    fn test_n_rounds_chain() {
        let mut expected = hmac_hex(SECRET.as_bytes(), b"Abc123!@1700000000000test-secret");
        for _ in 1..7 {
            expected = hmac_hex(SECRET.as_bytes(), expected.as_bytes());
        }
        assert_eq!(derive(PHRASE, TS, SECRET, 7).unwrap().as_str(), expected);
    }

    #[test]
    fn test_deterministic() {
        let a = derive(PHRASE, TS, SECRET, 50).unwrap();
        let b = derive(PHRASE, TS, SECRET, 50).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sensitive_to_every_input() {
        let base = derive(PHRASE, TS, SECRET, 3).unwrap();
        assert_ne!(base, derive("Abc123!$", TS, SECRET, 3).unwrap());
        assert_ne!(base, derive(PHRASE, "1700000000001", SECRET, 3).unwrap());
        assert_ne!(base, derive(PHRASE, TS, "test-secreT", 3).unwrap());
        assert_ne!(base, derive(PHRASE, TS, SECRET, 4).unwrap());
    }

    #[test]
    fn test_output_shape() {
        for rounds in [1, 2, 10, 257] {
            let out = derive(PHRASE, TS, SECRET, rounds).unwrap();
            assert_eq!(out.as_str().len(), 64);
            assert!(out
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_empty_secret_refused() {
        assert_eq!(derive(PHRASE, TS, "", 1), Err(DeriveError::EmptySecret));
    }

    #[test]
    fn test_zero_rounds_refused() {
        assert_eq!(derive(PHRASE, TS, SECRET, 0), Err(DeriveError::ZeroRounds));
    }

    #[test]
    fn test_deriver_matches_free_function() {
        let deriver = SecretDeriver::new(
            ServerSecret::new(SECRET).unwrap(),
            StretchCount::new(2).unwrap(),
            PhrasePolicy::standard(),
        );
        assert_eq!(deriver.derive(PHRASE, TS).unwrap().as_str(), TWO_ROUNDS);
        assert_eq!(deriver.generate(PHRASE, TS).unwrap().as_str(), TWO_ROUNDS);
    }

    #[test]
    fn test_generate_rejects_before_deriving() {
        let deriver = SecretDeriver::new(
            ServerSecret::new(SECRET).unwrap(),
            StretchCount::new(1).unwrap(),
            PhrasePolicy::standard(),
        );
        match deriver.generate("weak", TS) {
            Err(GenerateError::Validation(ValidationError::InvalidPhrase(_))) => {}
            other => panic!("expected phrase rejection, got {:?}", other),
        }
        match deriver.generate(PHRASE, "12345") {
            Err(GenerateError::Validation(ValidationError::InvalidTimestamp(_))) => {}
            other => panic!("expected timestamp rejection, got {:?}", other),
        }
    }
}
