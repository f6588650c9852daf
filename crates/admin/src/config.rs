//! Admin configuration loaded from environment variables.
//!
//! The admin binary talks to the commerce API with an elevated key that can
//! drive order lifecycle transitions and block users. It binds to loopback
//! by default; exposure beyond the internal network is a deployment error.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Elevated-access commerce API configuration
    pub commerce: AdminApiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Commerce API access with the admin key.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AdminApiConfig {
    /// Base URL of the commerce API
    pub base_url: String,
    /// Admin bearer token (lifecycle transitions, user management)
    pub api_key: SecretString,
}

impl std::fmt::Debug for AdminApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, unparseable, or
    /// holds a placeholder secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env if present; real environments set variables directly
        dotenvy::dotenv().ok();

        let host = match std::env::var("ADMIN_HOST") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), raw))?,
            Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = match std::env::var("ADMIN_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), raw))?,
            Err(_) => 3001,
        };

        let base_url = require("COMMERCE_API_URL")?;
        let api_key = SecretString::from(require("COMMERCE_ADMIN_API_KEY")?);
        validate_secret("COMMERCE_ADMIN_API_KEY", &api_key)?;

        Ok(Self {
            host,
            port,
            commerce: AdminApiConfig { base_url, api_key },
            sentry_dsn: std::env::var("SENTRY_DSN").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Socket address to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Reject obvious placeholder values before they reach production.
fn validate_secret(name: &str, secret: &SecretString) -> Result<(), ConfigError> {
    let value = secret.expose_secret().to_lowercase();
    for placeholder in ["changeme", "placeholder", "your-api-key", "xxx", "test-key"] {
        if value.contains(placeholder) {
            return Err(ConfigError::InsecureSecret(
                name.to_string(),
                format!("contains placeholder '{placeholder}'"),
            ));
        }
    }
    Ok(())
}
