//! Pluggable secret backends.
//!
//! Defines the core capability interface every backend variant implements,
//! plus the built-in variants: an in-memory store (always present, used for
//! tests and development) and a GCP Secret Manager adapter (feature `gcp`).

pub mod gcp;
pub mod memory;

pub use gcp::GcpBackendConfig;
#[cfg(feature = "gcp")]
pub use gcp::GcpSecretBackend;
pub use memory::{InMemoryBackend, MEMORY_BACKEND_NAME};

use crate::errors::Result;
use async_trait::async_trait;

/// Version string used when a caller omits the version.
pub const DEFAULT_VERSION: &str = "latest";

/// Trait for secret backends.
///
/// Implementations must be Send + Sync for use in async contexts.
#[async_trait]
pub trait SecretBackend: Send + Sync + std::fmt::Debug {
    /// Stable identifier for this backend.
    ///
    /// Used as the backend-table key and as part of cache keys, so it must
    /// not change over the life of the instance.
    fn name(&self) -> &str;

    /// Fetch a secret value by name and optional version.
    ///
    /// An omitted version means `"latest"`.
    ///
    /// # Errors
    /// - [`SecretsError::NotFound`] when the name or that specific version is absent
    /// - [`SecretsError::AccessDenied`] when the underlying store refuses the caller
    /// - Any other failure surfaces as an opaque backend error, never retried here
    ///
    /// [`SecretsError::NotFound`]: crate::errors::SecretsError::NotFound
    /// [`SecretsError::AccessDenied`]: crate::errors::SecretsError::AccessDenied
    async fn get(&self, name: &str, version: Option<&str>) -> Result<String>;

    /// Fetch the latest version of a secret.
    async fn get_latest(&self, name: &str) -> Result<String> {
        self.get(name, Some(DEFAULT_VERSION)).await
    }
}
