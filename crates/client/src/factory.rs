//! Version client factory.
//!
//! Builds a client from application configuration. Configuration problems
//! (missing credential, missing project id) surface here, before any
//! network attempt.

use crate::client::VersionClient;
use crate::providers::{HttpVersionClient, InMemoryVersionClient};
use promptops_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Create a version client for the named backend.
///
/// # Arguments
/// * `backend` - "http" (the prompt service) or "memory" (in-process, for dry runs)
/// * `config` - Application configuration
///
/// # Errors
/// Returns `AppError::Config` if the backend is unknown or the remote
/// settings are incomplete.
pub fn create_client(backend: &str, config: &AppConfig) -> AppResult<Arc<dyn VersionClient>> {
    match backend.to_lowercase().as_str() {
        "http" | "remote" => {
            let client = HttpVersionClient::from_config(config)?;
            tracing::debug!(
                "Using prompt service at {} (project {:?})",
                config.base_url,
                config.project_id
            );
            Ok(Arc::new(client))
        }
        "memory" => Ok(Arc::new(InMemoryVersionClient::new())),
        _ => Err(AppError::Config(format!(
            "Unknown backend: {}. Supported: http, memory",
            backend
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        AppConfig {
            api_key: Some("secret".to_string()),
            project_id: Some("7".to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_create_http_client() {
        let client = create_client("http", &configured()).unwrap();
        assert_eq!(client.backend_name(), "http");
    }

    #[test]
    fn test_http_requires_credentials() {
        match create_client("http", &AppConfig::default()) {
            Err(AppError::Config(msg)) => assert!(msg.contains("API key")),
            Err(other) => panic!("Expected configuration error, got {}", other),
            Ok(_) => panic!("Expected error without credentials"),
        }
    }

    #[test]
    fn test_memory_needs_no_credentials() {
        let client = create_client("memory", &AppConfig::default()).unwrap();
        assert_eq!(client.backend_name(), "memory");
    }

    #[test]
    fn test_unknown_backend() {
        match create_client("carrier-pigeon", &configured()) {
            Err(err) => assert!(err.to_string().contains("Unknown backend")),
            Ok(_) => panic!("Expected error for unknown backend"),
        }
    }
}
