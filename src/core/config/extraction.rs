//! Extraction service configuration.
//!
//! The credential is explicit configuration handed to the client constructor.
//! The only fallback source is the `LANDINGAI_API_KEY` environment variable,
//! consulted once by [`ExtractionConfig::resolve`].

use crate::core::errors::ConfigError;
use std::fmt;
use std::time::Duration;

/// Environment variable holding the default API key.
pub const API_KEY_ENV: &str = "LANDINGAI_API_KEY";

/// Default ADE parse endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.va.landing.ai/v1/ade/parse";

/// Default parse model identifier.
pub const DEFAULT_MODEL: &str = "dpt-2-latest";

/// Default request timeout. Parsing multi-page documents routinely takes a while.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// API key wrapper that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key, rejecting blank strings.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    /// Returns the raw key for the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Configuration for [`crate::client::AdeClient`].
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Credential sent as a bearer token.
    pub api_key: ApiKey,
    /// Parse endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl ExtractionConfig {
    /// Creates a configuration with the default endpoint, model and timeout.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolves the credential from an explicit value, falling back to
    /// [`API_KEY_ENV`].
    pub fn resolve(explicit: Option<String>) -> Result<Self, ConfigError> {
        Self::resolve_with(explicit, std::env::var(API_KEY_ENV).ok())
    }

    /// Resolves the credential from an explicit value, falling back to an
    /// already-read default. Blank values count as absent.
    pub fn resolve_with(
        explicit: Option<String>,
        fallback: Option<String>,
    ) -> Result<Self, ConfigError> {
        explicit
            .and_then(ApiKey::new)
            .or_else(|| fallback.and_then(ApiKey::new))
            .map(Self::new)
            .ok_or(ConfigError::MissingApiKey {
                env_var: API_KEY_ENV,
            })
    }

    /// Overrides the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the fields that the client cannot recover from at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "endpoint",
                message: format!("expected an http(s) URL, got '{}'", self.endpoint),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "model",
                message: "must not be empty".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
