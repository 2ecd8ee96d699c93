//! Secure credential handling for LLM and directory providers.
//!
//! Both backends Gavel talks to (the generation API and the business
//! directory) authenticate with a bearer-style key. This module gives every
//! provider the same safe handling:
//!
//! - **No accidental logging**: credentials never appear in Debug/Display
//! - **Memory safety**: zeroed on drop via the `secrecy` crate
//! - **Explicit exposure**: the raw value only leaves via `.expose()` at the
//!   point of use
//!
//! ## Usage
//!
//! ```ignore
//! use crate::providers::secrets::ApiCredential;
//!
//! // Load from one env var, or the first of several
//! let cred = ApiCredential::from_env("YELP_API_KEY", "Yelp API key")?;
//! let cred = ApiCredential::from_env_chain(
//!     &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
//!     "Gemini API key",
//! )?;
//!
//! // Use in an HTTP header (explicit exposure)
//! request.header("x-goog-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
///
/// Useful for debugging configuration issues without exposing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from configuration file/JSON
    Config,
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a raw value. After this point it cannot be accidentally logged.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from a single environment variable.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ProviderError> {
        std::env::var(env_var)
            .map(|v| Self::new(v, CredentialSource::Environment, name))
            .map_err(|_| {
                ProviderError::NotConfigured(format!(
                    "{name} not set: configure '{env_var}' environment variable"
                ))
            })
    }

    /// Load from the first set variable in a chain.
    ///
    /// The generation backend historically accepts its key under more than
    /// one variable name; earlier entries win.
    pub fn from_env_chain(env_vars: &[&str], name: &'static str) -> Result<Self, ProviderError> {
        for var in env_vars {
            if let Ok(value) = std::env::var(var) {
                return Ok(Self::new(value, CredentialSource::Environment, name));
            }
        }
        Err(ProviderError::NotConfigured(format!(
            "{name} not set: configure one of {env_vars:?}"
        )))
    }

    /// Load from JSON config, falling back to environment variables.
    ///
    /// The recommended path for provider factories: `config_key` in the JSON
    /// config wins, then each variable in `env_vars` in order.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_vars: &[&str],
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config[config_key].as_str() {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Ok(cred) = Self::from_env_chain(env_vars, name) {
            return Ok(cred);
        }

        Err(ProviderError::NotConfigured(format!(
            "{name} required: set '{config_key}' in config or one of {env_vars:?}"
        )))
    }

    /// Check availability without loading.
    pub fn is_available(config: &JsonValue, config_key: &str, env_vars: &[&str]) -> bool {
        config[config_key].as_str().is_some()
            || env_vars.iter().any(|v| std::env::var(v).is_ok())
    }

    /// Expose the credential value for use in API calls.
    ///
    /// Only call this where the credential is actually needed (setting an
    /// HTTP header). Never store the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Check if the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Get the source of this credential.
    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Get the human-readable name of this credential.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
