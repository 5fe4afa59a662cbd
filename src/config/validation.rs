//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Downstream URL must be a full `http` URL
//! - Listener addresses must parse as socket addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use axum::http::{HeaderName, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("downstream_url is not set")]
    MissingDownstream,

    #[error("downstream_url {url:?} is invalid: {reason}")]
    InvalidDownstream { url: String, reason: String },

    #[error("{field} {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("protocol.reply_id_header {0:?} is not a valid header name")]
    InvalidHeaderName(String),

    #[error("simulator.completion_status {0} is not a valid HTTP status")]
    InvalidStatus(u16),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_downstream(&config.downstream_url) {
        errors.push(e);
    }

    let addresses = [
        ("listener.proxy_address", &config.listener.proxy_address),
        ("listener.simulator_address", &config.listener.simulator_address),
    ];
    for (field, value) in addresses {
        check_address(field, value, &mut errors);
    }
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }
    if config.admin.enabled {
        check_address("admin.bind_address", &config.admin.bind_address, &mut errors);
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if HeaderName::from_bytes(config.protocol.reply_id_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.protocol.reply_id_header.clone(),
        ));
    }

    if StatusCode::from_u16(config.simulator.completion_status).is_err() {
        errors.push(ValidationError::InvalidStatus(config.simulator.completion_status));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_downstream(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::MissingDownstream);
    }
    let invalid = |reason: String| ValidationError::InvalidDownstream {
        url: raw.to_string(),
        reason,
    };
    if !raw.contains("://") {
        return Err(invalid("missing scheme".to_string()));
    }
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        ProxyConfig {
            downstream_url: "http://127.0.0.1:2080".to_string(),
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn accepts_defaults_with_downstream() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn rejects_url_without_scheme() {
        let mut config = valid();
        config.downstream_url = "127.0.0.1:2080".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidDownstream { .. }));
    }

    #[test]
    fn rejects_https_downstream() {
        let mut config = valid();
        config.downstream_url = "https://example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = valid();
        config.downstream_url.clear();
        config.listener.proxy_address = "nowhere".to_string();
        config.limits.max_body_bytes = 0;
        config.simulator.completion_status = 42;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MissingDownstream));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::InvalidStatus(42)));
    }

    #[test]
    fn disabled_admin_address_not_checked() {
        let mut config = valid();
        config.admin.bind_address = "bogus".to_string();
        assert!(validate_config(&config).is_ok());
        config.admin.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
