//! # Configuration
//!
//! Engine limits and service settings, with environment overrides.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LR_MAX_LOCATION_LEN` | `1024` | Maximum location length in bytes |
//! | `LR_MAX_TOKEN_URI_LEN` | `2048` | Maximum metadata URI length in bytes |
//! | `LR_MAX_CALL_DEPTH` | `64` | Maximum nesting of re-entrant operations |
//! | `LR_LOG_LEVEL` or `RUST_LOG` | `info` | Log filter |
//! | `LR_JSON_LOGS` | `false` | JSON formatted logs |

use crate::domain::invariants::limits;
use std::env;
use std::str::FromStr;

/// Registry engine limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum location length in bytes.
    pub max_location_len: usize,
    /// Maximum metadata URI length in bytes.
    pub max_token_uri_len: usize,
    /// Maximum nesting of mutating operations, the outermost one included.
    pub max_call_depth: u16,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_location_len: limits::MAX_LOCATION_LEN,
            max_token_uri_len: limits::MAX_TOKEN_URI_LEN,
            max_call_depth: limits::MAX_CALL_DEPTH,
        }
    }
}

impl RegistryConfig {
    /// Create configuration from environment variables, falling back to
    /// defaults for missing or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_location_len: env_or("LR_MAX_LOCATION_LEN", defaults.max_location_len),
            max_token_uri_len: env_or("LR_MAX_TOKEN_URI_LEN", defaults.max_token_uri_len),
            max_call_depth: env_or("LR_MAX_CALL_DEPTH", defaults.max_call_depth).max(1),
        }
    }
}

/// Land registry service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Engine limits.
    pub registry: RegistryConfig,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    /// Whether to emit JSON formatted logs.
    pub json_logs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LR_MAX_LOCATION_LEN`, `LR_MAX_TOKEN_URI_LEN`, `LR_MAX_CALL_DEPTH`:
    ///   engine limits
    /// - `LR_LOG_LEVEL` or `RUST_LOG`: log level (default: info)
    /// - `LR_JSON_LOGS`: JSON logs (default: false)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            registry: RegistryConfig::from_env(),
            log_level: env::var("LR_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            json_logs: env::var("LR_JSON_LOGS")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// TESTS
// =============================================================================
