//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::protocol::X_REPLY_ID;

/// Which role the process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Correlating reverse proxy in front of a downstream service.
    #[default]
    Proxy,
    /// Downstream simulator used to exercise a proxy.
    Simulator,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Proxy => f.write_str("proxy"),
            Mode::Simulator => f.write_str("simulator"),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy or simulator.
    pub mode: Mode,

    /// Downstream base URL in proxy mode; proxy URL to call back in
    /// simulator mode. Must carry a scheme.
    pub downstream_url: String,

    /// Listener addresses.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Correlation header naming.
    pub protocol: ProtocolConfig,

    /// Simulator behavior.
    pub simulator: SimulatorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API.
    pub admin: AdminConfig,
}

impl ProxyConfig {
    /// Address the active mode listens on.
    pub fn bind_address(&self) -> &str {
        match self.mode {
            Mode::Proxy => &self.listener.proxy_address,
            Mode::Simulator => &self.listener.simulator_address,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address in proxy mode.
    pub proxy_address: String,

    /// Bind address in simulator mode.
    pub simulator_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            proxy_address: "0.0.0.0:1080".to_string(),
            simulator_address: "0.0.0.0:2080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for one downstream call (seconds). Does not bound the wait
    /// for a deferred completion.
    pub downstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { downstream_secs: 10 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Correlation header naming.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Name of the reply-id header (some deployments use `X-R-Reply`).
    pub reply_id_header: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            reply_id_header: X_REPLY_ID.to_string(),
        }
    }
}

/// Downstream simulator behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Delay before the deferred completion is sent back (ms).
    pub callback_delay_ms: u64,

    /// Window advertised in `X-R-Reply-Timeout` (ms).
    pub reply_timeout_ms: u64,

    /// Status carried by the completion call.
    pub completion_status: u16,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            callback_delay_ms: 4_000,
            reply_timeout_ms: 30_000,
            completion_status: 201,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Scrape listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "callback_proxy=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin listener.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin listener bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:1081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_ports() {
        let config = ProxyConfig::default();
        assert_eq!(config.mode, Mode::Proxy);
        assert_eq!(config.bind_address(), "0.0.0.0:1080");
        assert_eq!(config.listener.simulator_address, "0.0.0.0:2080");
        assert_eq!(config.timeouts.downstream_secs, 10);
        assert_eq!(config.protocol.reply_id_header, "x-r-reply-id");
        assert!(!config.admin.enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            mode = "simulator"
            downstream_url = "http://127.0.0.1:1080"

            [simulator]
            callback_delay_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Simulator);
        assert_eq!(config.bind_address(), "0.0.0.0:2080");
        assert_eq!(config.simulator.callback_delay_ms, 100);
        assert_eq!(config.simulator.reply_timeout_ms, 30_000);
    }
}
