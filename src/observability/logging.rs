//! # Structured Logging
//!
//! Provides structured logging setup and span macros using the tracing
//! ecosystem.

use tracing_subscriber::{fmt, EnvFilter};

/// Create a tracing span for a secret resolution.
///
/// Carries the secret name, resolved version, and backend name as
/// attributes. The `otel.status_code` and `error.message` fields are
/// recorded by the resolver once the outcome is known.
///
/// ```rust,ignore
/// let span = secret_span!("api_key", "latest", "memory");
/// ```
#[macro_export]
macro_rules! secret_span {
    ($name:expr, $version:expr, $backend:expr) => {
        tracing::info_span!(
            "secret_resolve",
            secret.name = %$name,
            secret.version = %$version,
            secret.backend = %$backend,
            operation_id = %uuid::Uuid::new_v4(),
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty
        )
    };
}

/// Initialize structured logging.
///
/// `debug` raises the default verbosity to `debug`; `RUST_LOG` overrides the
/// default either way. Safe to call more than once; later calls are no-ops
/// when a global subscriber is already installed.
pub fn init_logging(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
