use std::env;
use std::time::Duration;

use paypal_nvp::{Credentials, Environment};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct CliConfig {
    /// API username (env: PAYPAL_USERNAME)
    pub username: String,
    /// API password (env: PAYPAL_PASSWORD)
    pub password: String,
    /// API signature (env: PAYPAL_SIGNATURE)
    pub signature: String,
    /// Target environment (env: PAYPAL_ENVIRONMENT, default: sandbox)
    pub environment: Environment,
    /// Per-request HTTP timeout (env: PAYPAL_TIMEOUT_SECS, default: 30)
    pub timeout: Duration,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CliConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `PAYPAL_TIMEOUT_SECS` alone, for commands that need no credentials.
    pub fn timeout_from_env() -> Result<Duration, ConfigError> {
        timeout_from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::MissingRequired(key))
        };

        let username = required("PAYPAL_USERNAME")?;
        let password = required("PAYPAL_PASSWORD")?;
        let signature = required("PAYPAL_SIGNATURE")?;

        let environment = match lookup("PAYPAL_ENVIRONMENT").filter(|s| !s.is_empty()) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvironment(value))?,
            None => Environment::Sandbox,
        };

        let timeout = timeout_from_lookup(&lookup)?;

        if environment == Environment::Production {
            tracing::warn!("PAYPAL_ENVIRONMENT=production: requests move real money");
        }

        Ok(Self {
            username,
            password,
            signature,
            environment,
            timeout,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password, &self.signature)
    }
}

fn timeout_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
    let secs = match lookup("PAYPAL_TIMEOUT_SECS").filter(|s| !s.is_empty()) {
        Some(value) => value
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout(value))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid PAYPAL_ENVIRONMENT '{0}' (expected sandbox or production)")]
    InvalidEnvironment(String),

    #[error("invalid PAYPAL_TIMEOUT_SECS '{0}'")]
    InvalidTimeout(String),
}
