//! # Keyplane
//!
//! Keyplane provides dependency-injectable access to secret values (API
//! keys, passwords, credentials) for application services, backed by
//! pluggable storage backends with caching, startup validation, and tracing.
//!
//! ## Architecture
//!
//! ```text
//! caller get(name, version?, backend?)
//!        ↓
//! SecretResolver ── backend table ──→ SecretBackend (memory | gcp | custom)
//!        ↓
//!   SecretCache (backend:name:version, optional TTL)
//! ```
//!
//! Components declare the secrets they need in a [`SecretRegistry`] before
//! startup; [`SecretResolver::initialize`] freezes that set and resolves
//! every requirement once, failing startup with an aggregate error if any
//! cannot be resolved.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use keyplane::{RegisterOptions, ResolverConfig, SecretRegistry, SecretResolver};
//!
//! #[tokio::main]
//! async fn main() -> keyplane::Result<()> {
//!     keyplane::init_logging(false);
//!
//!     let registry = SecretRegistry::new();
//!     registry.register("api_key", RegisterOptions::default());
//!
//!     let config = ResolverConfig::from_env()?;
//!     let resolver = SecretResolver::initialize(&config, &registry).await?;
//!
//!     let api_key = resolver.get("api_key", None, None).await?;
//!     let _ = api_key;
//!     Ok(())
//! }
//! ```

pub mod backends;
pub mod cache;
pub mod config;
pub mod errors;
pub mod observability;
pub mod registry;
pub mod resolver;
pub mod types;

// Re-export commonly used types and traits
pub use backends::{InMemoryBackend, SecretBackend, DEFAULT_VERSION};
pub use cache::SecretCache;
pub use config::ResolverConfig;
pub use errors::{Result, SecretsError};
pub use observability::init_logging;
pub use registry::{RegisterOptions, SecretRegistry, SecretRequirement};
pub use resolver::SecretResolver;
pub use types::SecretString;

#[cfg(feature = "gcp")]
pub use backends::GcpSecretBackend;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
