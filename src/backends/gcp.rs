//! GCP Secret Manager backend implementation.
//!
//! Fetches secret values from Google Cloud Secret Manager by name and
//! version.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `KEYPLANE_GCP_PROJECT_ID` or `GCP_PROJECT_ID` - Required
//! - `KEYPLANE_GCP_SECRET_PREFIX` - Optional prefix prepended to secret names
//! - `GOOGLE_APPLICATION_CREDENTIALS` - Path to a service account key
//!
//! ## Reference Format
//!
//! - `my-secret` resolves to `projects/{project}/secrets/{prefix}my-secret/versions/{version}`
//! - A full `projects/...` resource name is used as-is
//!
//! Payloads are normalized to strings: UTF-8 text is returned unchanged,
//! raw binary data is base64-encoded.

use crate::errors::Result;
use serde::{Deserialize, Serialize};

#[cfg(feature = "gcp")]
use super::{SecretBackend, DEFAULT_VERSION};
#[cfg(feature = "gcp")]
use crate::errors::SecretsError;
#[cfg(feature = "gcp")]
use async_trait::async_trait;
#[cfg(feature = "gcp")]
use tracing::{debug, error, info, warn};

#[cfg(feature = "gcp")]
use google_secretmanager1::{hyper_rustls, hyper_util, SecretManager};

/// Backend-table name of the GCP Secret Manager variant.
pub const GCP_BACKEND_NAME: &str = "gcp";

/// Configuration for the GCP Secret Manager backend.
///
/// Compiled unconditionally so [`ResolverConfig`] can carry it; only the
/// client itself is gated behind the `gcp` feature.
///
/// [`ResolverConfig`]: crate::config::ResolverConfig
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpBackendConfig {
    /// GCP project ID
    pub project_id: String,

    /// Optional prefix prepended to secret names (default: none)
    #[serde(default)]
    pub secret_prefix: String,
}

impl GcpBackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Uses:
    /// - `KEYPLANE_GCP_PROJECT_ID` or `GCP_PROJECT_ID` (required)
    /// - `KEYPLANE_GCP_SECRET_PREFIX` (default: empty)
    ///
    /// Returns `Ok(None)` if GCP is not configured (no project ID).
    pub fn from_env() -> Result<Option<Self>> {
        let project_id = std::env::var("KEYPLANE_GCP_PROJECT_ID")
            .or_else(|_| std::env::var("GCP_PROJECT_ID"))
            .ok();

        let Some(project_id) = project_id else {
            return Ok(None);
        };

        let secret_prefix = std::env::var("KEYPLANE_GCP_SECRET_PREFIX").unwrap_or_default();

        Ok(Some(Self { project_id, secret_prefix }))
    }
}

/// GCP Secret Manager backend.
///
/// Supports Application Default Credentials (ADC) and explicit service
/// account keys.
#[cfg(feature = "gcp")]
pub struct GcpSecretBackend {
    hub: SecretManager<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    >,
    project_id: String,
    secret_prefix: String,
}

#[cfg(feature = "gcp")]
impl std::fmt::Debug for GcpSecretBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretBackend")
            .field("project_id", &self.project_id)
            .field("secret_prefix", &self.secret_prefix)
            .field("hub", &"[SecretManager]")
            .finish()
    }
}

#[cfg(feature = "gcp")]
impl GcpSecretBackend {
    /// Create a new GCP Secret Manager backend with the given configuration.
    pub async fn new(config: GcpBackendConfig) -> Result<Self> {
        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(
                    hyper_rustls::HttpsConnectorBuilder::new()
                        .with_native_roots()
                        .map_err(|e| {
                            SecretsError::config(format!("Failed to load native TLS roots: {}", e))
                        })?
                        .https_or_http()
                        .enable_http2()
                        .build(),
                );

        // Credentials come from GOOGLE_APPLICATION_CREDENTIALS or the
        // runtime service account (GCE/Cloud Run/GKE).
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(
            yup_oauth2::read_service_account_key(
                std::env::var("GOOGLE_APPLICATION_CREDENTIALS").unwrap_or_default(),
            )
            .await
            .map_err(|e| {
                SecretsError::config(format!(
                    "Failed to read GCP credentials. Set GOOGLE_APPLICATION_CREDENTIALS or \
                    run on GCP with a service account: {}",
                    e
                ))
            })?,
        )
        .build()
        .await
        .map_err(|e| SecretsError::config(format!("Failed to build GCP authenticator: {}", e)))?;

        let hub = SecretManager::new(client, auth);

        info!(
            project_id = %config.project_id,
            secret_prefix = %config.secret_prefix,
            "Initialized GCP Secret Manager backend"
        );

        Ok(Self { hub, project_id: config.project_id, secret_prefix: config.secret_prefix })
    }

    /// Create a backend from environment configuration.
    pub async fn from_env() -> Result<Option<Self>> {
        match GcpBackendConfig::from_env()? {
            Some(config) => Ok(Some(Self::new(config).await?)),
            None => Ok(None),
        }
    }

    /// Build the full secret version resource name.
    ///
    /// A reference that is already a full `projects/...` path is used as-is.
    fn build_resource_name(&self, name: &str, version: &str) -> String {
        if name.starts_with("projects/") {
            return name.to_string();
        }
        format!(
            "projects/{}/secrets/{}{}/versions/{}",
            self.project_id, self.secret_prefix, name, version
        )
    }

    /// Normalize a payload to a string value.
    ///
    /// UTF-8 text is returned unchanged; raw binary data is base64-encoded.
    fn normalize_payload(data: Vec<u8>) -> String {
        match String::from_utf8(data) {
            Ok(text) => text,
            Err(e) => {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD.encode(e.into_bytes())
            }
        }
    }
}

#[cfg(feature = "gcp")]
#[async_trait]
impl SecretBackend for GcpSecretBackend {
    fn name(&self) -> &str {
        GCP_BACKEND_NAME
    }

    async fn get(&self, name: &str, version: Option<&str>) -> Result<String> {
        let version = version.unwrap_or(DEFAULT_VERSION);
        let resource_name = self.build_resource_name(name, version);

        debug!(
            secret = %name,
            version = %version,
            resource_name = %resource_name,
            "Fetching secret from GCP Secret Manager"
        );

        let result = self.hub.projects().secrets_versions_access(&resource_name).doit().await;

        match result {
            Ok((_, response)) => {
                let payload = response.payload.ok_or_else(|| {
                    warn!(secret = %name, "Secret has no payload");
                    SecretsError::backend_error(format!("Secret '{}' has no payload data", name))
                })?;

                let data = payload.data.ok_or_else(|| {
                    warn!(secret = %name, "Secret payload has no data");
                    SecretsError::backend_error(format!("Secret '{}' has empty payload", name))
                })?;

                Ok(Self::normalize_payload(data))
            }
            Err(e) => {
                let err_str = e.to_string();
                if err_str.contains("NOT_FOUND") || err_str.contains("404") {
                    error!(
                        secret = %name,
                        resource_name = %resource_name,
                        error = %e,
                        "Secret not found in GCP Secret Manager"
                    );
                    Err(SecretsError::not_found(format!("{} (version {})", name, version)))
                } else if err_str.contains("PERMISSION_DENIED") || err_str.contains("403") {
                    error!(
                        secret = %name,
                        error = %e,
                        "Permission denied accessing GCP secret"
                    );
                    Err(SecretsError::access_denied(name, err_str))
                } else {
                    // Other transport errors propagate unclassified.
                    error!(
                        secret = %name,
                        error = %e,
                        "Failed to fetch secret from GCP Secret Manager"
                    );
                    Err(SecretsError::backend_error(format!(
                        "Failed to fetch secret '{}' from GCP: {}",
                        name, e
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serializes tests that mutate process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_from_env_no_project() {
        let _guard = ENV_LOCK.lock().unwrap();
        let prev_kp = std::env::var("KEYPLANE_GCP_PROJECT_ID").ok();
        let prev_gcp = std::env::var("GCP_PROJECT_ID").ok();

        std::env::remove_var("KEYPLANE_GCP_PROJECT_ID");
        std::env::remove_var("GCP_PROJECT_ID");

        let config = GcpBackendConfig::from_env().unwrap();
        assert!(config.is_none(), "Config should be None when no project ID is set");

        if let Some(v) = prev_kp {
            std::env::set_var("KEYPLANE_GCP_PROJECT_ID", v);
        }
        if let Some(v) = prev_gcp {
            std::env::set_var("GCP_PROJECT_ID", v);
        }
    }

    #[test]
    fn test_config_from_env_with_project() {
        let _guard = ENV_LOCK.lock().unwrap();
        let unique_project = format!("test-project-{}", std::process::id());
        std::env::set_var("KEYPLANE_GCP_PROJECT_ID", &unique_project);
        std::env::remove_var("KEYPLANE_GCP_SECRET_PREFIX");

        let config = GcpBackendConfig::from_env().unwrap().unwrap();
        assert_eq!(config.project_id, unique_project);
        assert_eq!(config.secret_prefix, "");

        std::env::remove_var("KEYPLANE_GCP_PROJECT_ID");
    }

    #[test]
    fn test_config_with_custom_prefix() {
        let _guard = ENV_LOCK.lock().unwrap();
        let unique_project = format!("test-project-prefix-{}", std::process::id());
        std::env::set_var("KEYPLANE_GCP_PROJECT_ID", &unique_project);
        std::env::set_var("KEYPLANE_GCP_SECRET_PREFIX", "my-app/");

        let config = GcpBackendConfig::from_env().unwrap().unwrap();
        assert_eq!(config.secret_prefix, "my-app/");

        std::env::remove_var("KEYPLANE_GCP_PROJECT_ID");
        std::env::remove_var("KEYPLANE_GCP_SECRET_PREFIX");
    }

    #[test]
    fn test_config_serialization() {
        let config = GcpBackendConfig {
            project_id: "my-project".to_string(),
            secret_prefix: String::new(),
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("my-project"));

        let parsed: GcpBackendConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.project_id, config.project_id);
    }

    // Resource name building - tests the logic without needing a GCP client
    #[test]
    fn test_build_resource_name_simple() {
        let project_id = "test-project";
        let secret_prefix = "app/";
        let name = "my-secret";
        let version = "latest";

        let resource = if name.starts_with("projects/") {
            name.to_string()
        } else {
            format!(
                "projects/{}/secrets/{}{}/versions/{}",
                project_id, secret_prefix, name, version
            )
        };

        assert_eq!(resource, "projects/test-project/secrets/app/my-secret/versions/latest");
    }

    #[test]
    fn test_build_resource_name_full_path() {
        let full_path = "projects/other-project/secrets/other-secret/versions/5";

        let resource = if full_path.starts_with("projects/") {
            full_path.to_string()
        } else {
            unreachable!()
        };

        assert_eq!(resource, full_path);
    }

    #[cfg(feature = "gcp")]
    #[test]
    fn test_normalize_payload_text_and_binary() {
        assert_eq!(GcpSecretBackend::normalize_payload(b"plain-text".to_vec()), "plain-text");

        // Invalid UTF-8 falls back to base64.
        let binary = vec![0xff, 0xfe, 0x00, 0x01];
        let normalized = GcpSecretBackend::normalize_payload(binary.clone());
        use base64::Engine;
        assert_eq!(normalized, base64::engine::general_purpose::STANDARD.encode(&binary));
    }
}
