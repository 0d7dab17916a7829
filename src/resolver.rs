//! Secret resolver service.
//!
//! Owns the backend table and the cache, orchestrates cache-then-backend
//! lookup, and runs startup validation over the requirement registry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn, Instrument};

use crate::backends::{InMemoryBackend, SecretBackend, DEFAULT_VERSION};
use crate::cache::SecretCache;
use crate::config::ResolverConfig;
use crate::errors::{Result, SecretsError};
use crate::registry::SecretRegistry;
use crate::secret_span;

#[cfg(feature = "gcp")]
use crate::backends::GcpSecretBackend;

/// Unified access point for secret values across registered backends.
///
/// Lookup flow: resolve the target backend (explicit name or the configured
/// default), check the cache, fetch from the backend on a miss, cache the
/// result, return. Concurrent lookups for the same key may each miss the
/// cache and fetch redundantly; there is no single-flight coalescing.
pub struct SecretResolver {
    default_backend: String,
    cache_enabled: bool,
    backends: RwLock<HashMap<String, Arc<dyn SecretBackend>>>,
    cache: SecretCache,
    memory: Arc<InMemoryBackend>,
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("default_backend", &self.default_backend)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_ttl", &self.cache.ttl())
            .finish()
    }
}

impl SecretResolver {
    /// Build a resolver from configuration without running validation.
    ///
    /// The in-memory backend is always registered, pre-seeded from
    /// `memory_secrets`. The GCP backend is registered iff `config.gcp` is
    /// present and the `gcp` feature is enabled.
    pub async fn new(config: &ResolverConfig) -> Result<Self> {
        config.validate()?;

        let ttl = if config.cache_enabled { config.cache_ttl() } else { None };
        let memory = Arc::new(InMemoryBackend::with_secrets(&config.memory_secrets).await);

        let mut backends: HashMap<String, Arc<dyn SecretBackend>> = HashMap::new();
        backends
            .insert(memory.name().to_string(), Arc::clone(&memory) as Arc<dyn SecretBackend>);

        let resolver = Self {
            default_backend: config.default_backend.clone(),
            cache_enabled: config.cache_enabled,
            backends: RwLock::new(backends),
            cache: SecretCache::new(ttl),
            memory,
        };

        #[cfg(feature = "gcp")]
        if let Some(gcp) = &config.gcp {
            let backend = GcpSecretBackend::new(gcp.clone()).await?;
            resolver.register_backend(Arc::new(backend)).await;
        }

        #[cfg(not(feature = "gcp"))]
        if config.gcp.is_some() {
            warn!(
                "GCP configuration present but the 'gcp' feature is not enabled; \
                backend not registered"
            );
        }

        Ok(resolver)
    }

    /// Build a resolver and run startup validation over the registry.
    ///
    /// This is the finalize step of the two-phase registration protocol:
    /// requirements declared into `registry` are frozen here and each is
    /// resolved once. If `config.validate_on_startup` is disabled, validation
    /// is skipped.
    pub async fn initialize(config: &ResolverConfig, registry: &SecretRegistry) -> Result<Self> {
        let resolver = Self::new(config).await?;
        if config.validate_on_startup {
            resolver.validate(registry).await?;
        }
        Ok(resolver)
    }

    /// Resolve a secret value.
    ///
    /// An omitted version means `"latest"`; an omitted backend means the
    /// configured default. Emits one tracing span per call with the secret
    /// name, resolved version, and backend name; OK/ERROR status is recorded
    /// on the span without altering error propagation.
    pub async fn get(
        &self,
        name: &str,
        version: Option<&str>,
        backend: Option<&str>,
    ) -> Result<String> {
        let version = version.unwrap_or(DEFAULT_VERSION);
        let backend_name = backend.unwrap_or(&self.default_backend).to_string();

        let span = secret_span!(name, version, backend_name);
        let result = self.resolve(name, version, &backend_name).instrument(span.clone()).await;

        match &result {
            Ok(_) => {
                span.record("otel.status_code", "OK");
            }
            Err(e) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.message", tracing::field::display(e));
            }
        }
        result
    }

    /// Resolve the latest version of a secret.
    pub async fn get_latest(&self, name: &str, backend: Option<&str>) -> Result<String> {
        self.get(name, Some(DEFAULT_VERSION), backend).await
    }

    async fn resolve(&self, name: &str, version: &str, backend_name: &str) -> Result<String> {
        let backend = {
            let backends = self.backends.read().await;
            match backends.get(backend_name) {
                Some(backend) => Arc::clone(backend),
                None => {
                    let mut available: Vec<String> = backends.keys().cloned().collect();
                    available.sort();
                    return Err(SecretsError::unknown_backend(backend_name, available));
                }
            }
        };

        if self.cache_enabled {
            if let Some(value) = self.cache.get(backend_name, name, Some(version)).await {
                return Ok(value);
            }
        }

        let value = backend.get(name, Some(version)).await?;

        if self.cache_enabled {
            self.cache.set(backend_name, name, &value, Some(version)).await;
        }

        Ok(value)
    }

    /// Register a backend, overwriting any existing entry with the same name.
    pub async fn register_backend(&self, backend: Arc<dyn SecretBackend>) {
        let name = backend.name().to_string();
        info!(backend = %name, "Registering secret backend");
        self.backends.write().await.insert(name, backend);
    }

    /// Sorted list of registered backend names.
    pub async fn backend_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove all cached values.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Number of currently cached entries.
    pub async fn cache_size(&self) -> usize {
        self.cache.len().await
    }

    /// Direct handle to the in-memory backend, for test setups.
    pub fn memory_backend(&self) -> Arc<InMemoryBackend> {
        Arc::clone(&self.memory)
    }

    /// Validate every registered requirement by resolving it once.
    ///
    /// Failures are collected, not thrown immediately, so the aggregate error
    /// reports everything wrong in one pass. An empty registry succeeds
    /// trivially. Successful resolutions populate the cache as usual.
    pub async fn validate(&self, registry: &SecretRegistry) -> Result<()> {
        let requirements = registry.all();
        if requirements.is_empty() {
            debug!("No secret requirements registered; validation is a no-op");
            return Ok(());
        }

        info!(count = requirements.len(), "Validating registered secret requirements");

        let mut failures = Vec::new();
        for requirement in requirements {
            match self
                .get(
                    &requirement.name,
                    requirement.version.as_deref(),
                    requirement.backend.as_deref(),
                )
                .await
            {
                Ok(_) => {
                    info!(
                        secret = %requirement.name,
                        token = %requirement.token,
                        "Secret requirement validated"
                    );
                }
                Err(e) => {
                    warn!(
                        secret = %requirement.name,
                        token = %requirement.token,
                        error = %e,
                        "Secret requirement failed validation"
                    );
                    failures.push(format!("secret '{}': {}", requirement.name, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SecretsError::validation_failed(failures))
        }
    }
}
