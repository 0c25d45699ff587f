use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Listen address (default: 127.0.0.1:8787).
    pub bind_addr: String,
    /// Shared access password. Unset means every edit request is refused with 500.
    pub access_password: Option<String>,
    /// Upstream API key. Unset means edits fail with 500 after authentication.
    pub google_api_key: Option<String>,
    /// Base URL of the upstream `models` collection.
    pub api_base_url: String,
    pub hair_model: String,
    pub fashion_model: String,
    /// Timeout in seconds for a single upstream call.
    pub upstream_timeout_secs: u64,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from `SEASONAL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("SEASONAL_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string()),
            access_password: env_opt("SEASONAL_ACCESS_PASSWORD"),
            google_api_key: env_opt("SEASONAL_GOOGLE_API_KEY").or_else(|| env_opt("GOOGLE_API_KEY")),
            api_base_url: std::env::var("SEASONAL_API_BASE_URL")
                .unwrap_or_else(|_| seasonal_gateway::gemini::DEFAULT_BASE_URL.to_string()),
            hair_model: std::env::var("SEASONAL_HAIR_MODEL")
                .unwrap_or_else(|_| seasonal_gateway::gemini::DEFAULT_HAIR_MODEL.to_string()),
            fashion_model: std::env::var("SEASONAL_FASHION_MODEL")
                .unwrap_or_else(|_| seasonal_gateway::gemini::DEFAULT_FASHION_MODEL.to_string()),
            upstream_timeout_secs: env_u64("SEASONAL_UPSTREAM_TIMEOUT_SECS", 60),
            max_body_bytes: env_usize("SEASONAL_MAX_BODY_BYTES", 20 * 1024 * 1024),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// Unset and empty are treated the same.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
