//! In-memory secret backend.
//!
//! A pure local table mapping secret name -> version -> value. Always
//! registered with the resolver; test setups manipulate it directly via the
//! resolver's [`memory_backend`] accessor.
//!
//! Versions are independent entries: storing a secret only under version
//! `"1"` does NOT make it retrievable via `"latest"`. There is no implicit
//! promotion of the newest explicit version to `"latest"`; callers that want
//! a `"latest"` entry set it explicitly. This deliberately differs from
//! networked stores, which maintain their own notion of "latest".
//!
//! [`memory_backend`]: crate::resolver::SecretResolver::memory_backend

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{SecretBackend, DEFAULT_VERSION};
use crate::errors::{Result, SecretsError};
use crate::types::SecretString;

/// Backend-table name of the in-memory variant.
pub const MEMORY_BACKEND_NAME: &str = "memory";

/// In-memory secret backend (development and tests).
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    secrets: RwLock<HashMap<String, HashMap<String, SecretString>>>,
}

impl InMemoryBackend {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with values, stored under `"latest"`.
    pub async fn with_secrets(seed: &HashMap<String, SecretString>) -> Self {
        let backend = Self::new();
        for (name, value) in seed {
            backend.set(name, value.expose_secret()).await;
        }
        backend
    }

    /// Store a value under the `"latest"` version.
    pub async fn set(&self, name: &str, value: &str) {
        self.set_version(name, DEFAULT_VERSION, value).await;
    }

    /// Store a value under an explicit version.
    pub async fn set_version(&self, name: &str, version: &str, value: &str) {
        let mut secrets = self.secrets.write().await;
        secrets
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string(), SecretString::new(value));
    }

    /// Remove one version of a secret. Returns true iff it existed.
    ///
    /// A secret with zero remaining versions is removed entirely.
    pub async fn delete(&self, name: &str, version: Option<&str>) -> bool {
        let version = version.unwrap_or(DEFAULT_VERSION);
        let mut secrets = self.secrets.write().await;
        let Some(versions) = secrets.get_mut(name) else {
            return false;
        };
        let removed = versions.remove(version).is_some();
        if versions.is_empty() {
            secrets.remove(name);
        }
        removed
    }

    /// Remove all secrets.
    pub async fn clear_all(&self) {
        self.secrets.write().await.clear();
    }

    /// Number of distinct secret names currently stored.
    pub async fn len(&self) -> usize {
        self.secrets.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.secrets.read().await.is_empty()
    }
}

#[async_trait]
impl SecretBackend for InMemoryBackend {
    fn name(&self) -> &str {
        MEMORY_BACKEND_NAME
    }

    async fn get(&self, name: &str, version: Option<&str>) -> Result<String> {
        let version = version.unwrap_or(DEFAULT_VERSION);
        let secrets = self.secrets.read().await;
        secrets
            .get(name)
            .and_then(|versions| versions.get(version))
            .map(|value| value.expose_secret().to_string())
            .ok_or_else(|| SecretsError::not_found(format!("{} (version {})", name, version)))
    }
}
