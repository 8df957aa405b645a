// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The Fitbit client credentials are optional at startup. Their absence is
//! reported per request by the gateway as a server misconfiguration, so a
//! misconfigured deployment still serves health checks and manual logging.

use crate::services::fitbit::{ClientCredentials, DEFAULT_API_BASE, DEFAULT_AUTH_URL};
use std::env;

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process store; data is lost on restart.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Fitbit OAuth client ID
    pub fitbit_client_id: Option<String>,
    /// Fitbit Web API base URL (token endpoint and data endpoints hang off it)
    pub fitbit_api_base: String,
    /// Fitbit authorization page
    pub fitbit_auth_url: String,
    /// Redirect URI registered with Fitbit for the OAuth callback
    pub fitbit_redirect_uri: String,
    /// Frontend URL for CORS on the authenticated API
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Storage backend
    pub store_backend: StoreBackend,

    // --- Secrets ---
    /// Fitbit OAuth client secret (never leaves the server)
    pub fitbit_client_secret: Option<String>,
    /// Generative-AI key for the plan generators (served elsewhere)
    pub gemini_api_key: Option<String>,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            fitbit_client_id: Some("test_client_id".to_string()),
            fitbit_api_base: DEFAULT_API_BASE.to_string(),
            fitbit_auth_url: DEFAULT_AUTH_URL.to_string(),
            fitbit_redirect_uri: "http://localhost:5173/callback".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            fitbit_client_secret: Some("test_secret".to_string()),
            gemini_api_key: None,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("firestore") | Err(_) => StoreBackend::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        Ok(Self {
            fitbit_client_id: optional_var("FITBIT_CLIENT_ID"),
            fitbit_api_base: env::var("FITBIT_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            fitbit_auth_url: env::var("FITBIT_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            fitbit_redirect_uri: env::var("FITBIT_REDIRECT_URI")
                .unwrap_or_else(|_| format!("{}/callback", frontend_url)),
            frontend_url,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,

            fitbit_client_secret: optional_var("FITBIT_CLIENT_SECRET"),
            gemini_api_key: optional_var("GEMINI_API_KEY"),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Fitbit client credentials, if both halves are configured.
    pub fn fitbit_credentials(&self) -> Option<ClientCredentials> {
        match (&self.fitbit_client_id, &self.fitbit_client_secret) {
            (Some(id), Some(secret)) => Some(ClientCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        }
    }
}

/// Read a variable, treating empty or whitespace-only values as absent.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("FITBIT_CLIENT_ID", "test_id");
        env::set_var("FITBIT_CLIENT_SECRET", " test_secret \n");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("OAUTH_STATE_KEY", "test_state_key");
        env::set_var("FITBIT_API_BASE", "http://127.0.0.1:9999/");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.fitbit_client_id.as_deref(), Some("test_id"));
        assert_eq!(config.fitbit_client_secret.as_deref(), Some("test_secret"));
        assert_eq!(config.fitbit_api_base, "http://127.0.0.1:9999");
        assert_eq!(config.port, 8080);
        assert!(config.fitbit_credentials().is_some());
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let mut config = Config::test_default();
        config.fitbit_client_secret = None;
        assert!(config.fitbit_credentials().is_none());
    }
}
