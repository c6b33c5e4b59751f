//! Configuration structures
//!
//! Deserialized from environment variables or a config file by the infra
//! loader; consumed when wiring the gateway and the lifecycle manager.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HTTP_TIMEOUT_SECS, SESSION_INACTIVITY_TIMEOUT_MS};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Identity backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

/// Session expiry policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity window after which a session is treated as void.
    pub inactivity_timeout_ms: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { inactivity_timeout_ms: SESSION_INACTIVITY_TIMEOUT_MS }
    }
}

const fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}
