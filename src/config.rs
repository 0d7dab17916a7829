//! # Configuration Settings
//!
//! Defines the configuration for the secret resolver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::backends::{GcpBackendConfig, MEMORY_BACKEND_NAME};
use crate::errors::{Result, SecretsError};
use crate::types::SecretString;

fn default_backend() -> String {
    MEMORY_BACKEND_NAME.to_string()
}

fn default_true() -> bool {
    true
}

/// Resolver configuration.
///
/// Recognized options and defaults:
/// - `default_backend`: backend used when a call does not name one (`"memory"`)
/// - `cache_enabled`: whether resolved values are memoized (true)
/// - `cache_ttl_secs`: cache entry lifetime; `None` means unlimited
/// - `validate_on_startup`: fail application startup if any declared secret
///   cannot be resolved (true)
/// - `memory_secrets`: preload map for the in-memory backend, stored under
///   the `"latest"` version
/// - `debug`: raises default diagnostic log verbosity only (false)
/// - `gcp`: GCP Secret Manager settings; the backend is registered iff this
///   is present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_backend")]
    pub default_backend: String,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,

    #[serde(default = "default_true")]
    pub validate_on_startup: bool,

    #[serde(default)]
    pub memory_secrets: HashMap<String, SecretString>,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub gcp: Option<GcpBackendConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            cache_enabled: true,
            cache_ttl_secs: None,
            validate_on_startup: true,
            memory_secrets: HashMap::new(),
            debug: false,
            gcp: None,
        }
    }
}

impl ResolverConfig {
    /// Create configuration from environment variables.
    ///
    /// Recognized variables: `KEYPLANE_DEFAULT_BACKEND`,
    /// `KEYPLANE_CACHE_ENABLED`, `KEYPLANE_CACHE_TTL_SECS`,
    /// `KEYPLANE_VALIDATE_ON_STARTUP`, `KEYPLANE_DEBUG`, plus the GCP
    /// variables documented on [`GcpBackendConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let default_backend =
            std::env::var("KEYPLANE_DEFAULT_BACKEND").unwrap_or_else(|_| default_backend());

        let cache_enabled = std::env::var("KEYPLANE_CACHE_ENABLED")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);

        let cache_ttl_secs = match std::env::var("KEYPLANE_CACHE_TTL_SECS") {
            Ok(s) => Some(s.parse::<u64>().map_err(|e| {
                SecretsError::config(format!("Invalid KEYPLANE_CACHE_TTL_SECS: {}", e))
            })?),
            Err(_) => None,
        };

        let validate_on_startup = std::env::var("KEYPLANE_VALIDATE_ON_STARTUP")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);

        let debug = std::env::var("KEYPLANE_DEBUG")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let config = Self {
            default_backend,
            cache_enabled,
            cache_ttl_secs,
            validate_on_startup,
            memory_secrets: HashMap::new(),
            debug,
            gcp: GcpBackendConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.default_backend.is_empty() {
            return Err(SecretsError::config("default_backend cannot be empty"));
        }
        if let Some(gcp) = &self.gcp {
            if gcp.project_id.is_empty() {
                return Err(SecretsError::config("GCP project_id cannot be empty"));
            }
        }
        Ok(())
    }

    /// Cache TTL as a Duration; `None` means entries never expire.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}
