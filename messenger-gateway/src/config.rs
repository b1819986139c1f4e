//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables. Everything the webhook
//! pipeline and the Graph client need is an explicit field here; nothing is
//! swapped process-wide after startup.

use std::env;
use std::str::FromStr;
use tracing::warn;

use crate::graph::DebugType;
use crate::web::is_signature_verification_enabled;

/// Default Graph API host.
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Path the webhook endpoint is mounted on
    pub webhook_path: String,

    /// Token echoed by the platform during the subscription handshake
    pub verify_token: String,

    /// App secret used for `x-hub-signature` verification.
    ///
    /// `None` disables signature verification entirely.
    pub app_secret: Option<String>,

    /// Page access token for outbound Graph API calls
    pub access_token: String,

    /// Base URL of the Graph API (overridable for tests and proxies)
    pub graph_api_url: String,

    /// Optional Graph API debug level attached to outbound calls
    pub graph_api_debug: Option<DebugType>,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Maximum accepted webhook body size in bytes
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            webhook_path: "/webhook".to_string(),
            verify_token: String::new(),
            app_secret: None,
            access_token: String::new(),
            graph_api_url: DEFAULT_GRAPH_API_URL.to_string(),
            graph_api_debug: None,
            request_timeout_ms: 8000,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            webhook_path: env::var("WEBHOOK_PATH")
                .ok()
                .filter(|p| p.starts_with('/'))
                .unwrap_or(defaults.webhook_path),

            verify_token: env::var("VERIFY_TOKEN").unwrap_or_default(),

            app_secret: parse_secret("APP_SECRET"),

            access_token: env::var("ACCESS_TOKEN").unwrap_or_default(),

            graph_api_url: env::var("GRAPH_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.graph_api_url),

            graph_api_debug: parse_optional("GRAPH_API_DEBUG"),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),

            max_body_bytes: parse_or("MAX_BODY_BYTES", defaults.max_body_bytes),
        }
    }

    /// Whether inbound POST bodies are checked against `x-hub-signature`.
    pub fn verifies_signatures(&self) -> bool {
        is_signature_verification_enabled(&self.app_secret)
    }
}

/// Parse a variable into `T`, falling back to `default` when unset or invalid.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse an optional variable; invalid values are logged and treated as unset.
fn parse_optional<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, ignoring");
            None
        }
    }
}

/// Read a secret, treating an empty value as not configured.
fn parse_secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}
