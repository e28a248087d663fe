//! # Phrase Policy
//!
//! Complexity rules a passphrase must satisfy before derivation.
//!
//! Two presets exist:
//!
//! | Preset | Required classes |
//! |--------|------------------|
//! | `standard` | letter, digit, symbol |
//! | `mixed-case` | letter, digit, symbol, uppercase, lowercase |
//!
//! With `restrict_alphabet` set, every character must be an ASCII letter, an
//! ASCII digit or one of `allowed_symbols`.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Default minimum phrase length, in characters.
pub const DEFAULT_MIN_LENGTH: usize = 6;

/// Default set of accepted special characters.
pub const DEFAULT_ALLOWED_SYMBOLS: &str = "@$!%*?&";

/// A character class the phrase must contain at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhraseRule {
    /// ASCII letter, either case
    Letter,
    /// ASCII digit
    Digit,
    /// One of the policy's allowed symbols
    Symbol,
    /// ASCII uppercase letter
    Uppercase,
    /// ASCII lowercase letter
    Lowercase,
}

impl PhraseRule {
    /// Whether `c` belongs to this class under `policy`.
    pub fn matches(self, c: char, policy: &PhrasePolicy) -> bool {
        match self {
            PhraseRule::Letter => c.is_ascii_alphabetic(),
            PhraseRule::Digit => c.is_ascii_digit(),
            PhraseRule::Symbol => policy.is_symbol(c),
            PhraseRule::Uppercase => c.is_ascii_uppercase(),
            PhraseRule::Lowercase => c.is_ascii_lowercase(),
        }
    }

    fn describe(self, policy: &PhrasePolicy) -> String {
        match self {
            PhraseRule::Letter => "letter".to_string(),
            PhraseRule::Digit => "number".to_string(),
            PhraseRule::Symbol => format!("special character ({})", policy.allowed_symbols),
            PhraseRule::Uppercase => "uppercase letter".to_string(),
            PhraseRule::Lowercase => "lowercase letter".to_string(),
        }
    }
}

/// Passphrase complexity policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhrasePolicy {
    /// Minimum length in characters
    pub min_length: usize,
    /// Characters accepted as symbols
    pub allowed_symbols: String,
    /// Classes that must each appear at least once
    pub rules: Vec<PhraseRule>,
    /// Reject characters outside letters, digits and `allowed_symbols`
    pub restrict_alphabet: bool,
}

impl Default for PhrasePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl PhrasePolicy {
    /// Letter, digit and symbol required.
    pub fn standard() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            allowed_symbols: DEFAULT_ALLOWED_SYMBOLS.to_string(),
            rules: vec![PhraseRule::Letter, PhraseRule::Digit, PhraseRule::Symbol],
            restrict_alphabet: true,
        }
    }

    /// Standard rules plus both letter cases.
    pub fn mixed_case() -> Self {
        let mut policy = Self::standard();
        policy
            .rules
            .extend([PhraseRule::Uppercase, PhraseRule::Lowercase]);
        policy
    }

    /// Look up a preset by name (`standard` or `mixed-case`).
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::standard()),
            "mixed-case" | "mixed_case" => Ok(Self::mixed_case()),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }

    /// Replace the minimum length.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Check the policy itself is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_length == 0 {
            return Err(ConfigError::ZeroMinLength);
        }
        Ok(())
    }

    /// Whether `c` is one of the allowed symbols.
    pub fn is_symbol(&self, c: char) -> bool {
        self.allowed_symbols.contains(c)
    }

    /// Whether `c` may appear in a phrase at all.
    pub fn is_allowed(&self, c: char) -> bool {
        !self.restrict_alphabet || c.is_ascii_alphanumeric() || self.is_symbol(c)
    }

    /// Whether `phrase` satisfies every rule.
    pub fn accepts(&self, phrase: &str) -> bool {
        if phrase.chars().count() < self.min_length {
            return false;
        }
        if !phrase.chars().all(|c| self.is_allowed(c)) {
            return false;
        }
        self.rules
            .iter()
            .all(|rule| phrase.chars().any(|c| rule.matches(c, self)))
    }

    /// Human-readable statement of the policy, used in rejection messages.
    pub fn describe(&self) -> String {
        let has_case_rule = self
            .rules
            .iter()
            .any(|r| matches!(r, PhraseRule::Uppercase | PhraseRule::Lowercase));

        let mut seen = Vec::with_capacity(self.rules.len());
        let classes: Vec<String> = self
            .rules
            .iter()
            .copied()
            // A case rule already implies a letter.
            .filter(|r| !(has_case_rule && *r == PhraseRule::Letter))
            .filter(|r| {
                if seen.contains(r) {
                    false
                } else {
                    seen.push(*r);
                    true
                }
            })
            .map(|r| format!("one {}", r.describe(self)))
            .collect();

        let length = format!("be at least {} characters long", self.min_length);
        let mut text = match classes.as_slice() {
            [] => format!("It must {}.", length),
            [only] => format!("It must contain at least {}, and {}.", only, length),
            [first, second] => format!(
                "It must contain at least {} and {}, and {}.",
                first, second, length
            ),
            [init @ .., last] => format!(
                "It must contain at least {}, and {}, and {}.",
                init.join(", "),
                last,
                length
            ),
        };

        if self.restrict_alphabet {
            text.push_str(&format!(
                " Only letters, numbers and {} are allowed.",
                self.allowed_symbols
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_preset() {
        let policy = PhrasePolicy::standard();
        assert_eq!(policy.min_length, 6);
        assert_eq!(policy.allowed_symbols, "@$!%*?&");
        assert!(policy.accepts("abc12!"));
        assert!(!policy.accepts("abcdef"));
    }

    #[test]
    fn test_mixed_case_preset() {
        let policy = PhrasePolicy::mixed_case();
        assert!(!policy.accepts("abc12!"));
        assert!(policy.accepts("Abc12!"));
    }

    #[test]
    fn test_from_preset() {
        assert_eq!(
            PhrasePolicy::from_preset("standard").unwrap(),
            PhrasePolicy::standard()
        );
        assert_eq!(
            PhrasePolicy::from_preset("Mixed-Case").unwrap(),
            PhrasePolicy::mixed_case()
        );
        assert!(matches!(
            PhrasePolicy::from_preset("paranoid"),
            Err(ConfigError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn test_restricted_alphabet() {
        let policy = PhrasePolicy::standard();
        // '#' is not in the allowed symbol set
        assert!(!policy.accepts("abc12!#"));
        assert!(!policy.accepts("abc12! "));
        assert!(!policy.accepts("äbc12!x"));

        let open = PhrasePolicy {
            restrict_alphabet: false,
            ..PhrasePolicy::standard()
        };
        assert!(open.accepts("abc12!#"));
    }

    #[test]
    fn test_custom_symbols() {
        let policy = PhrasePolicy {
            allowed_symbols: "#".to_string(),
            ..PhrasePolicy::standard()
        };
        assert!(policy.accepts("abc12#"));
        assert!(!policy.accepts("abc12!"));
    }

    #[test]
    fn test_zero_min_length_invalid() {
        let policy = PhrasePolicy::standard().with_min_length(0);
        assert_eq!(policy.validate(), Err(ConfigError::ZeroMinLength));
        assert!(PhrasePolicy::standard().validate().is_ok());
    }

    #[test]
    fn test_describe_standard() {
        assert_eq!(
            PhrasePolicy::standard().describe(),
            "It must contain at least one letter, one number, and one special character \
             (@$!%*?&), and be at least 6 characters long. \
             Only letters, numbers and @$!%*?& are allowed."
        );
    }

    #[test]
    fn test_describe_mixed_case_omits_plain_letter() {
        let text = PhrasePolicy::mixed_case().describe();
        assert!(text.contains("one uppercase letter"));
        assert!(text.contains("one lowercase letter"));
        assert!(!text.contains("one letter"));
    }

    #[test]
    fn test_serde_rule_names() {
        let json = serde_json::to_string(&PhraseRule::Uppercase).unwrap();
        assert_eq!(json, "\"uppercase\"");
        let policy: PhrasePolicy = serde_json::from_str(r#"{"min_length": 8}"#).unwrap();
        assert_eq!(policy.min_length, 8);
        assert_eq!(policy.rules, PhrasePolicy::standard().rules);
    }
}
