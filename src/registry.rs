//! Registry of declared secret requirements.
//!
//! Components declare the secrets they need before the application starts;
//! the resolver consults the registry once during startup validation. This is
//! explicit process-wide mutable state with a caller-controlled lifecycle:
//! populate during construction, pass into [`SecretResolver::initialize`],
//! reset only via [`SecretRegistry::clear`] in test teardown.
//!
//! Registration is a two-phase protocol: declarations collect here, then
//! resolver initialization snapshots the set and validates it. Nothing
//! registers as a hidden side effect.
//!
//! [`SecretResolver::initialize`]: crate::resolver::SecretResolver::initialize

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::backends::DEFAULT_VERSION;

/// Backend token component used when a requirement does not pin a backend.
const DEFAULT_BACKEND_TOKEN: &str = "default";

/// A declared need for a named (and optionally versioned, optionally
/// backend-pinned) secret value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRequirement {
    /// Secret name.
    pub name: String,

    /// Pinned version; `None` means `"latest"`.
    pub version: Option<String>,

    /// Pinned backend; `None` means the resolver's configured default.
    pub backend: Option<String>,

    /// Deterministic dedup token derived from `(backend, name, version)`.
    pub token: String,
}

/// Options for [`SecretRegistry::register`].
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    pub version: Option<String>,
    pub backend: Option<String>,
}

impl RegisterOptions {
    /// Pin a specific version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Pin a specific backend.
    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }
}

/// Derive the deterministic token for a `(backend, name, version)` tuple.
fn requirement_token(name: &str, version: Option<&str>, backend: Option<&str>) -> String {
    format!(
        "{}:{}:{}",
        backend.unwrap_or(DEFAULT_BACKEND_TOKEN),
        name,
        version.unwrap_or(DEFAULT_VERSION)
    )
}

/// Table of declared secret requirements, keyed by token.
///
/// Multiple declarations of the same `(name, version, backend)` tuple
/// collapse to one entry; the last registration wins.
#[derive(Debug, Default)]
pub struct SecretRegistry {
    requirements: RwLock<HashMap<String, SecretRequirement>>,
}

impl SecretRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a secret requirement. Idempotent for identical inputs.
    pub fn register(&self, name: &str, options: RegisterOptions) -> SecretRequirement {
        let token = requirement_token(name, options.version.as_deref(), options.backend.as_deref());
        let requirement = SecretRequirement {
            name: name.to_string(),
            version: options.version,
            backend: options.backend,
            token: token.clone(),
        };

        debug!(token = %token, secret = %name, "Registered secret requirement");
        self.requirements
            .write()
            .expect("secret registry lock poisoned")
            .insert(token, requirement.clone());
        requirement
    }

    /// Snapshot of all current registrations.
    pub fn all(&self) -> Vec<SecretRequirement> {
        self.requirements
            .read()
            .expect("secret registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Empties the registry. Intended for test teardown.
    pub fn clear(&self) {
        self.requirements.write().expect("secret registry lock poisoned").clear();
    }

    /// Count of registrations.
    pub fn len(&self) -> usize {
        self.requirements.read().expect("secret registry lock poisoned").len()
    }

    /// Check if no requirements are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_returns_requirement() {
        let registry = SecretRegistry::new();
        let req = registry.register("api_key", RegisterOptions::default());

        assert_eq!(req.name, "api_key");
        assert_eq!(req.version, None);
        assert_eq!(req.backend, None);
        assert_eq!(req.token, "default:api_key:latest");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_dedups_by_token() {
        let registry = SecretRegistry::new();
        registry.register("x", RegisterOptions::default());
        registry.register("x", RegisterOptions::default());

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_explicit_latest_matches_omitted_version() {
        let registry = SecretRegistry::new();
        let omitted = registry.register("x", RegisterOptions::default());
        let explicit = registry.register("x", RegisterOptions::default().version("latest"));

        assert_eq!(omitted.token, explicit.token);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_tuples_are_distinct_entries() {
        let registry = SecretRegistry::new();
        registry.register("x", RegisterOptions::default());
        registry.register("x", RegisterOptions::default().version("1"));
        registry.register("x", RegisterOptions::default().backend("gcp"));
        registry.register("y", RegisterOptions::default());

        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = SecretRegistry::new();
        registry.register("x", RegisterOptions::default());
        let second = registry.register("x", RegisterOptions::default());

        let all = registry.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], second);
    }

    #[test]
    fn test_clear_empties_registry() {
        let registry = SecretRegistry::new();
        registry.register("a", RegisterOptions::default());
        registry.register("b", RegisterOptions::default());
        assert!(!registry.is_empty());

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.all().is_empty());
    }

    #[test]
    fn test_token_composition() {
        assert_eq!(requirement_token("name", None, None), "default:name:latest");
        assert_eq!(requirement_token("name", Some("3"), Some("gcp")), "gcp:name:3");
    }
}
