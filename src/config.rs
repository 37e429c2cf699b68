// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Collaborator credentials are grouped per service and handed to the
//! adapters at construction time, so tests can build the same services
//! against local stubs.

use std::env;

/// Moves (location history) API settings.
#[derive(Debug, Clone)]
pub struct MovesConfig {
    /// Base URL, without trailing slash
    pub api_url: String,
    /// How many past days of places to request per webhook
    pub past_days: u32,
}

/// TomTom reverse-geocoding settings.
#[derive(Debug, Clone)]
pub struct TomTomConfig {
    pub api_url: String,
    pub api_key: String,
}

/// Twilio messaging settings.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub api_url: String,
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number for outbound texts
    pub from_number: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and redirects
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Path segment the upstream webhook must post to
    pub webhook_path_secret: String,
    /// JWT signing key for recipient-management sessions (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- Collaborators ---
    pub moves: MovesConfig,
    pub tomtom: TomTomConfig,
    pub twilio: TwilioConfig,
}

const DEFAULT_MOVES_API_URL: &str = "https://api.moves-app.com/api/1.1";
const DEFAULT_TOMTOM_API_URL: &str = "https://api.tomtom.com";
const DEFAULT_TWILIO_API_URL: &str = "https://api.twilio.com";
const DEFAULT_PAST_DAYS: u32 = 3;

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8080)?,

            webhook_path_secret: required("WEBHOOK_PATH_SECRET")?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            moves: MovesConfig {
                api_url: url_or("MOVES_API_URL", DEFAULT_MOVES_API_URL),
                past_days: parse_or("MOVES_PAST_DAYS", DEFAULT_PAST_DAYS)?,
            },
            tomtom: TomTomConfig {
                api_url: url_or("TOMTOM_API_URL", DEFAULT_TOMTOM_API_URL),
                api_key: required("TOMTOM_API_KEY")?,
            },
            twilio: TwilioConfig {
                api_url: url_or("TWILIO_API_URL", DEFAULT_TWILIO_API_URL),
                account_sid: required("TWILIO_ACCOUNT_SID")?,
                auth_token: required("TWILIO_AUTH_TOKEN")?,
                from_number: required("TWILIO_FROM_NUMBER")?,
            },
        })
    }

    /// Deterministic config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            webhook_path_secret: "test-webhook-secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            moves: MovesConfig {
                api_url: "http://127.0.0.1:9/moves".to_string(),
                past_days: DEFAULT_PAST_DAYS,
            },
            tomtom: TomTomConfig {
                api_url: "http://127.0.0.1:9/tomtom".to_string(),
                api_key: "test_tomtom_key".to_string(),
            },
            twilio: TwilioConfig {
                api_url: "http://127.0.0.1:9/twilio".to_string(),
                account_sid: "ACtest".to_string(),
                auth_token: "test_auth_token".to_string(),
                from_number: "+15550000000".to_string(),
            },
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn url_or(name: &str, default: &str) -> String {
    env::var(name)
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so everything env-dependent runs in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("WEBHOOK_PATH_SECRET", "hook");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("TOMTOM_API_KEY", "tt");
        env::set_var("TWILIO_ACCOUNT_SID", "AC123");
        env::set_var("TWILIO_AUTH_TOKEN", " secret \n");
        env::set_var("TWILIO_FROM_NUMBER", "+15551230000");
        env::set_var("TWILIO_API_URL", "http://localhost:4010/");
        env::remove_var("PORT");
        env::remove_var("MOVES_PAST_DAYS");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.webhook_path_secret, "hook");
        assert_eq!(config.twilio.auth_token, "secret");
        assert_eq!(config.twilio.api_url, "http://localhost:4010");
        assert_eq!(config.moves.past_days, DEFAULT_PAST_DAYS);
        assert_eq!(config.tomtom.api_url, DEFAULT_TOMTOM_API_URL);

        env::set_var("MOVES_PAST_DAYS", "many");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("MOVES_PAST_DAYS", _)));
        env::remove_var("MOVES_PAST_DAYS");

        env::remove_var("TOMTOM_API_KEY");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TOMTOM_API_KEY")));
    }
}
