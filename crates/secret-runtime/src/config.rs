//! # Runtime Configuration
//!
//! Process configuration assembled from an optional `.env` file and the
//! environment.
//!
//! ## Security Requirements
//!
//! - `SECRET` MUST be set and non-empty; there is no default
//! - The secret value is never echoed in errors or logs

use secret_derivation::{
    ConfigError, PhrasePolicy, SecretDeriver, ServerSecret, StretchCount, DEFAULT_STRETCH_COUNT,
};
use secret_gateway::GatewayConfig;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable names.
pub mod vars {
    pub const SECRET: &str = "SECRET";
    pub const STRETCH_COUNT: &str = "STRETCH_COUNT";
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
    pub const CORS_ORIGINS: &str = "CORS_ORIGINS";
    pub const RATE_LIMIT_MAX: &str = "RATE_LIMIT_MAX";
    pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
    pub const RATE_LIMIT_ENABLED: &str = "RATE_LIMIT_ENABLED";
    pub const TRUST_PROXY: &str = "TRUST_PROXY";
    pub const MAX_BODY_BYTES: &str = "MAX_BODY_BYTES";
    pub const PHRASE_POLICY: &str = "PHRASE_POLICY";
    pub const PHRASE_MIN_LENGTH: &str = "PHRASE_MIN_LENGTH";
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// HTTP gateway configuration.
    pub gateway: GatewayConfig,
    /// Server secret keying every derivation.
    pub secret: ServerSecret,
    /// Stretch rounds per derivation.
    pub rounds: StretchCount,
    /// Passphrase acceptance policy.
    pub policy: PhrasePolicy,
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeConfigError {
    /// Required variable not set.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// Variable set but unparsable.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Derivation settings rejected.
    #[error(transparent)]
    Core(#[from] ConfigError),

    /// Gateway settings rejected.
    #[error("gateway: {0}")]
    Gateway(#[from] secret_gateway::domain::ConfigError),
}

impl RuntimeConfig {
    /// Load from the process environment. Call [`load_dotenv`] first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, RuntimeConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Unset and blank variables take their defaults, except `SECRET`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = match lookup(vars::SECRET) {
            Some(secret) => ServerSecret::new(secret)?,
            None => return Err(RuntimeConfigError::MissingVar(vars::SECRET)),
        };

        let rounds = StretchCount::new(
            parse_var(&lookup, vars::STRETCH_COUNT)?.unwrap_or(DEFAULT_STRETCH_COUNT),
        )?;

        let mut policy = match value(&lookup, vars::PHRASE_POLICY) {
            Some(name) => PhrasePolicy::from_preset(&name)?,
            None => PhrasePolicy::standard(),
        };
        if let Some(min_length) = parse_var(&lookup, vars::PHRASE_MIN_LENGTH)? {
            policy = policy.with_min_length(min_length);
        }
        policy.validate()?;

        let mut gateway = GatewayConfig::default();
        if let Some(host) = parse_var(&lookup, vars::HOST)? {
            gateway.http.host = host;
        }
        if let Some(port) = parse_var(&lookup, vars::PORT)? {
            gateway.http.port = port;
        }
        if let Some(origins) = value(&lookup, vars::CORS_ORIGINS) {
            gateway.cors.allowed_origins = parse_origins(&origins)?;
        }
        if let Some(max) = parse_var(&lookup, vars::RATE_LIMIT_MAX)? {
            gateway.rate_limit.max_requests = max;
        }
        if let Some(window) = parse_var(&lookup, vars::RATE_LIMIT_WINDOW_SECS)? {
            gateway.rate_limit.window_secs = window;
        }
        if let Some(enabled) = parse_bool(&lookup, vars::RATE_LIMIT_ENABLED)? {
            gateway.rate_limit.enabled = enabled;
        }
        if let Some(trust) = parse_bool(&lookup, vars::TRUST_PROXY)? {
            gateway.rate_limit.trust_proxy_headers = trust;
        }
        if let Some(limit) = parse_var(&lookup, vars::MAX_BODY_BYTES)? {
            gateway.limits.max_request_size = limit;
        }
        gateway.validate()?;

        Ok(Self {
            gateway,
            secret,
            rounds,
            policy,
        })
    }

    /// Split into the gateway config and a ready deriver.
    pub fn into_parts(self) -> (GatewayConfig, SecretDeriver) {
        let deriver = SecretDeriver::new(self.secret, self.rounds, self.policy);
        (self.gateway, deriver)
    }
}

/// Load `.env` into the process environment without overriding variables
/// that are already set. Returns the file path when one was found.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Trimmed, non-blank value of `name`.
fn value<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, RuntimeConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    value(lookup, name)
        .map(|raw| {
            raw.parse().map_err(|e: T::Err| RuntimeConfigError::InvalidVar {
                name,
                reason: e.to_string(),
                value: raw,
            })
        })
        .transpose()
}

fn parse_bool<F>(lookup: &F, name: &'static str) -> Result<Option<bool>, RuntimeConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    value(lookup, name)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(RuntimeConfigError::InvalidVar {
                name,
                value: raw,
                reason: "expected true or false".into(),
            }),
        })
        .transpose()
}

fn parse_origins(raw: &str) -> Result<Vec<String>, RuntimeConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        return Err(RuntimeConfigError::InvalidVar {
            name: vars::CORS_ORIGINS,
            value: raw.to_string(),
            reason: "no origins listed".into(),
        });
    }
    Ok(origins)
}
