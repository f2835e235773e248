//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check listener addresses and TLS presence
//! - Validate value ranges (timeouts > 0, gzip level)
//! - Check route methods and handler lists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Handler names are checked later, against the registry, when routes are built

use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no listener configured; set `listener.http` or `listener.https`")]
    NoListeners,

    #[error("invalid {field} address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("`listener.https` requires a [tls] section with cert/key paths or inline PEM")]
    MissingTls,

    #[error("`{0}` must be greater than zero")]
    ZeroValue(&'static str),

    #[error("compression level {0} is outside 0..=9")]
    CompressionLevel(u32),

    #[error("route #{index} (`{pattern}`) has no methods")]
    NoMethods { index: usize, pattern: String },

    #[error("route #{index} (`{pattern}`) has invalid method `{method}`")]
    InvalidMethod {
        index: usize,
        pattern: String,
        method: String,
    },

    #[error("route #{index} (`{pattern}`) has an empty handler name")]
    EmptyHandlerName { index: usize, pattern: String },
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.http.is_none() && listener.https.is_none() {
        errors.push(ValidationError::NoListeners);
    }
    check_address(&mut errors, "listener.http", listener.http.as_deref());
    check_address(&mut errors, "listener.https", listener.https.as_deref());

    if listener.https.is_some() {
        let usable = config
            .tls
            .as_ref()
            .is_some_and(|tls| tls.has_inline() || tls.has_files());
        if !usable {
            errors.push(ValidationError::MissingTls);
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            Some(&config.observability.metrics_address),
        );
    }

    let timeouts = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.read_secs", config.timeouts.read_secs),
        ("timeouts.idle_secs", config.timeouts.idle_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::ZeroValue(field));
        }
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }
    if config.compression.level > 9 {
        errors.push(ValidationError::CompressionLevel(config.compression.level));
    }

    for (index, route) in config.routes.iter().enumerate() {
        if route.methods.is_empty() {
            errors.push(ValidationError::NoMethods {
                index,
                pattern: route.pattern.clone(),
            });
        }
        for method in &route.methods {
            if Method::from_bytes(method.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidMethod {
                    index,
                    pattern: route.pattern.clone(),
                    method: method.clone(),
                });
            }
        }
        if route.handlers.iter().any(|h| h.trim().is_empty()) {
            errors.push(ValidationError::EmptyHandlerName {
                index,
                pattern: route.pattern.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, TlsConfig};

    fn route(pattern: &str, methods: &[&str], handlers: &[&str]) -> RouteConfig {
        RouteConfig {
            name: None,
            pattern: pattern.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            strict: true,
            handlers: handlers.iter().map(|h| h.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.listener.http = Some("not-an-address".into());
        config.timeouts.request_secs = 0;
        config.compression.level = 12;
        config.routes.push(route("/a", &[], &["x"]));
        config.routes.push(route("/b", &["GET", "BAD METHOD"], &[""]));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6, "{:?}", errors);
        assert!(errors.contains(&ValidationError::CompressionLevel(12)));
        assert!(errors.contains(&ValidationError::ZeroValue("timeouts.request_secs")));
    }

    #[test]
    fn test_connection_timeouts_must_be_positive() {
        let mut config = AppConfig::default();
        config.timeouts.read_secs = 0;
        config.timeouts.idle_secs = 0;
        assert_eq!(
            validate_config(&config),
            Err(vec![
                ValidationError::ZeroValue("timeouts.read_secs"),
                ValidationError::ZeroValue("timeouts.idle_secs"),
            ])
        );
    }

    #[test]
    fn test_no_listeners() {
        let mut config = AppConfig::default();
        config.listener.http = None;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::NoListeners])
        );
    }

    #[test]
    fn test_https_requires_tls() {
        let mut config = AppConfig::default();
        config.listener.https = Some("127.0.0.1:8443".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MissingTls])
        );

        config.tls = Some(TlsConfig {
            cert_path: Some("cert.pem".into()),
            key_path: Some("key.pem".into()),
            ..TlsConfig::default()
        });
        assert_eq!(validate_config(&config), Ok(()));
    }
}
