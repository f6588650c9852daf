//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars)
//! - `COMMERCE_API_URL` - Base URL of the remote commerce API
//! - `COMMERCE_API_KEY` - Bearer token for the commerce API
//! - `PAYMENT_GATEWAY_URL` - Base URL of the payment redirect service
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PAYMENT_RETURN_URL` - Gateway return callback (default: `<base_url>/checkout/return`)
//! - `PAYMENT_LOCALE` - Gateway interface locale, `vn` or `en` (default: vn)
//! - `PRICING_VAT_PERCENT` - VAT percentage (default: 10)
//! - `PRICING_REGULAR_FEE` - Regular delivery fee in VND (default: 30000)
//! - `PRICING_RUSH_FEE` - Rush delivery fee in VND (default: 50000)
//! - `PRICING_RUSH_REGION` - The one province rush delivery serves (default: Hanoi)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use spindle_core::Price;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Remote commerce API configuration
    pub commerce: CommerceApiConfig,
    /// Payment gateway configuration
    pub payment: PaymentGatewayConfig,
    /// Delivery fee and VAT policy
    pub pricing: PricingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Remote commerce API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct CommerceApiConfig {
    /// Base URL of the commerce API (catalog, orders, users)
    pub base_url: String,
    /// Bearer token (server-side only)
    pub api_key: SecretString,
}

impl std::fmt::Debug for CommerceApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Payment gateway (redirect flow) configuration.
#[derive(Debug, Clone)]
pub struct PaymentGatewayConfig {
    /// Base URL of the payment redirect service
    pub base_url: String,
    /// Where the gateway sends the customer back after payment
    pub return_url: String,
    /// Gateway interface locale (`vn` or `en`)
    pub locale: String,
}

/// Delivery fee and VAT policy.
///
/// Fees are flat per parcel: a mixed rush/regular order ships as two parcels
/// and pays both fees.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// VAT percentage applied to the subtotal
    pub vat_percent: u32,
    /// Fee for the regular-delivery parcel
    pub regular_fee: Price,
    /// Fee for the rush-delivery parcel
    pub rush_fee: Price,
    /// The single province rush delivery serves
    pub rush_region: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            vat_percent: 10,
            regular_fee: Price::new(30_000),
            rush_fee: Price::new(50_000),
            rush_region: "Hanoi".to_owned(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (length, placeholder detection).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let commerce = CommerceApiConfig::from_env()?;
        let payment = PaymentGatewayConfig::from_env(&base_url)?;
        let pricing = PricingConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            commerce,
            payment,
            pricing,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CommerceApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("COMMERCE_API_URL")?,
            api_key: get_validated_secret("COMMERCE_API_KEY")?,
        })
    }
}

impl PaymentGatewayConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        let locale = get_env_or_default("PAYMENT_LOCALE", "vn");
        if locale != "vn" && locale != "en" {
            return Err(ConfigError::InvalidEnvVar(
                "PAYMENT_LOCALE".to_string(),
                format!("must be 'vn' or 'en', got '{locale}'"),
            ));
        }
        Ok(Self {
            base_url: get_required_env("PAYMENT_GATEWAY_URL")?,
            return_url: std::env::var("PAYMENT_RETURN_URL")
                .unwrap_or_else(|_| format!("{base_url}/checkout/return")),
            locale,
        })
    }
}

impl PricingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            vat_percent: get_env_parsed("PRICING_VAT_PERCENT", defaults.vat_percent)?,
            regular_fee: Price::new(get_env_parsed(
                "PRICING_REGULAR_FEE",
                defaults.regular_fee.as_i64(),
            )?),
            rush_fee: Price::new(get_env_parsed(
                "PRICING_RUSH_FEE",
                defaults.rush_fee.as_i64(),
            )?),
            rush_region: get_env_or_default("PRICING_RUSH_REGION", &defaults.rush_region),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed to a numeric type, with a default.
fn get_env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Validate that a secret is not an obvious placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
