//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener addresses.
    pub listener: ListenerConfig,

    /// Certificate source for the HTTPS listener.
    pub tls: Option<TlsConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Response compression.
    pub compression: CompressionConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route definitions, tried in the order listed.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Plain HTTP bind address (e.g., "0.0.0.0:8080").
    pub http: Option<String>,

    /// HTTPS bind address. Requires `[tls]`.
    pub https: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            http: Some("0.0.0.0:8080".to_string()),
            https: None,
        }
    }
}

/// TLS certificate source.
///
/// Inline PEM wins over file paths when both are given.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: Option<String>,

    /// Path to private key file (PEM).
    pub key_path: Option<String>,

    /// Certificate chain as inline PEM.
    pub cert_pem: Option<String>,

    /// Private key as inline PEM.
    pub key_pem: Option<String>,
}

impl TlsConfig {
    pub fn has_inline(&self) -> bool {
        self.cert_pem.is_some() && self.key_pem.is_some()
    }

    pub fn has_files(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }
}

/// Route configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Route template, e.g. "/users/:id" or "/static/*".
    pub pattern: String,

    /// HTTP methods this route answers.
    pub methods: Vec<String>,

    /// Require the path to have as many segments as the pattern.
    #[serde(default = "default_strict")]
    pub strict: bool,

    /// Names of registered handlers, run in order.
    #[serde(default)]
    pub handlers: Vec<String>,
}

fn default_strict() -> bool {
    true
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Time allowed for a client to send the request headers, in seconds.
    pub read_secs: u64,

    /// Idle connection timeout in seconds: no bytes read or written.
    pub idle_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            read_secs: 30,
            idle_secs: 30,
            shutdown_secs: 30,
        }
    }
}

/// Gzip response compression.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CompressionConfig {
    /// Compress responses for clients sending `Accept-Encoding: gzip`.
    pub enabled: bool,

    /// Gzip level, 0 (none) to 9 (best).
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: 6,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
