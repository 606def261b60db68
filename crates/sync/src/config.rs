//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BASKET_SNAPSHOT_DIR` - Directory for guest snapshots (default: `.basket`)
//! - `BASKET_REMOTE_URL` - Base URL of the cart service; without it the store
//!   runs guest-only
//! - `BASKET_ACCESS_TOKEN` - Bearer token for the cart service
//! - `BASKET_SUBJECT` - Subject reported for the signed-in shopper (default: `shopper`)
//! - `BASKET_REMOTE_TIMEOUT_SECS` - Per-call remote timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use basket_core::{Identity, IdentityStatus};

const DEFAULT_SNAPSHOT_DIR: &str = ".basket";
const DEFAULT_SUBJECT: &str = "shopper";
const DEFAULT_REMOTE_TIMEOUT_SECS: &str = "30";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Synchronization store configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory holding guest snapshot files
    pub snapshot_dir: PathBuf,
    /// Cart service base URL; `None` runs guest-only
    pub remote_url: Option<Url>,
    /// Cart service bearer token (secret)
    pub access_token: Option<SecretString>,
    /// Subject for the signed-in shopper
    pub subject: String,
    /// Upper bound on every remote call
    pub remote_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or the access token
    /// fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let snapshot_dir = PathBuf::from(get_env_or_default(
            "BASKET_SNAPSHOT_DIR",
            DEFAULT_SNAPSHOT_DIR,
        ));
        let remote_url = get_optional_env("BASKET_REMOTE_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("BASKET_REMOTE_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let access_token = get_optional_env("BASKET_ACCESS_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "BASKET_ACCESS_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;
        let subject = get_env_or_default("BASKET_SUBJECT", DEFAULT_SUBJECT);
        let remote_timeout = parse_timeout(&get_env_or_default(
            "BASKET_REMOTE_TIMEOUT_SECS",
            DEFAULT_REMOTE_TIMEOUT_SECS,
        ))?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            snapshot_dir,
            remote_url,
            access_token,
            subject,
            remote_timeout,
            sentry_dsn,
        })
    }

    /// Identity signal implied by the configuration.
    ///
    /// A configured access token means the shopper is signed in.
    #[must_use]
    pub fn identity_status(&self) -> IdentityStatus {
        match &self.access_token {
            Some(token) => IdentityStatus::Identified(
                Identity::new(self.subject.clone()).with_token(token.clone()),
            ),
            None => IdentityStatus::Anonymous,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw.parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("BASKET_REMOTE_TIMEOUT_SECS".to_string(), e.to_string())
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "BASKET_REMOTE_TIMEOUT_SECS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
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

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("45").unwrap(), Duration::from_secs(45));
        assert!(matches!(
            parse_timeout("0"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            parse_timeout("soon"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_identity_status_follows_token() {
        let mut config = SyncConfig {
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            remote_url: None,
            access_token: None,
            subject: "c-42".to_string(),
            remote_timeout: Duration::from_secs(30),
            sentry_dsn: None,
        };
        assert!(matches!(
            config.identity_status(),
            IdentityStatus::Anonymous
        ));

        config.access_token = Some(SecretString::from("aB3$xY9!mK2@nL5#"));
        let status = config.identity_status();
        assert_eq!(status.identity().map(|i| i.subject.as_str()), Some("c-42"));
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = SyncConfig {
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            remote_url: Some(Url::parse("https://carts.test/api").unwrap()),
            access_token: Some(SecretString::from("super_secret_cart_token")),
            subject: DEFAULT_SUBJECT.to_string(),
            remote_timeout: Duration::from_secs(30),
            sentry_dsn: None,
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("carts.test"));
        assert!(!debug_output.contains("super_secret_cart_token"));
    }
}
