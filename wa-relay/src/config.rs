//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup and shared read-only with the
//! handlers through [`crate::web::AppState`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

/// Verify token used when `VERIFY_TOKEN` is unset.
pub const DEFAULT_VERIFY_TOKEN: &str = "testtoken123";

/// Downstream base URL used when `DOWNSTREAM_BASE_URL` is unset or invalid.
pub const DEFAULT_DOWNSTREAM_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default timeout for a single forward call.
pub const DEFAULT_FORWARD_TIMEOUT_MS: u64 = 15_000;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret the platform echoes back during the subscription handshake
    pub verify_token: String,

    /// Base URL of the downstream chat service, without a trailing slash
    pub downstream_base_url: String,

    /// Timeout applied to each forward call
    pub forward_timeout: Duration,

    /// Optional list of origins allowed by CORS; any origin when unset
    pub cors_allow_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", 3000),

            verify_token: env::var("VERIFY_TOKEN")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_VERIFY_TOKEN.to_string()),

            downstream_base_url: parse_base_url(
                "DOWNSTREAM_BASE_URL",
                DEFAULT_DOWNSTREAM_BASE_URL,
            ),

            forward_timeout: Duration::from_millis(parse_or(
                "FORWARD_TIMEOUT_MS",
                DEFAULT_FORWARD_TIMEOUT_MS,
            )),

            cors_allow_origins: parse_csv("CORS_ALLOW_ORIGINS"),
        }
    }

    /// Full URL of the downstream chat endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.downstream_base_url.trim_end_matches('/'))
    }

    /// Whether the handshake secret is still the built-in default.
    pub fn uses_default_verify_token(&self) -> bool {
        self.verify_token == DEFAULT_VERIFY_TOKEN
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            verify_token: DEFAULT_VERIFY_TOKEN.to_string(),
            downstream_base_url: DEFAULT_DOWNSTREAM_BASE_URL.to_string(),
            forward_timeout: Duration::from_millis(DEFAULT_FORWARD_TIMEOUT_MS),
            cors_allow_origins: None,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read and validate an absolute http(s) base URL.
fn parse_base_url(name: &str, default: &str) -> String {
    let raw = match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return default.to_string(),
    };

    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            url.as_str().trim_end_matches('/').to_string()
        }
        _ => {
            warn!(env_var = name, value = %raw, "Invalid base URL, using default");
            default.to_string()
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
