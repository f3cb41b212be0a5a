use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CHECKOUT_PRODUCTION_URL, CHECKOUT_SANDBOX_URL, NVP_PRODUCTION_URL, NVP_SANDBOX_URL,
};

/// Which PayPal environment a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox {
            Self::Sandbox
        } else {
            Self::Production
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Self::Sandbox)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    /// Accepts the environment name or a boolean sandbox flag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "true" | "1" => Ok(Self::Sandbox),
            "production" | "live" | "false" | "0" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Base URLs used by a client or verifier.
///
/// [`Endpoints::for_environment`] returns the fixed PayPal pair. Tests point
/// [`Endpoints::custom`] at a local double instead of mutating shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// NVP API endpoint.
    pub nvp_url: String,
    /// `webscr` endpoint: checkout redirect base and IPN validation target.
    pub webscr_url: String,
}

impl Endpoints {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Sandbox => Self {
                nvp_url: NVP_SANDBOX_URL.to_string(),
                webscr_url: CHECKOUT_SANDBOX_URL.to_string(),
            },
            Environment::Production => Self {
                nvp_url: NVP_PRODUCTION_URL.to_string(),
                webscr_url: CHECKOUT_PRODUCTION_URL.to_string(),
            },
        }
    }

    pub fn custom(nvp_url: impl Into<String>, webscr_url: impl Into<String>) -> Self {
        Self {
            nvp_url: nvp_url.into(),
            webscr_url: webscr_url.into(),
        }
    }
}
