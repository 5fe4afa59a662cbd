//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (C4PROXY_CONFIG)
//!     → environment overrides (C4PROXY_TO, C4PROXY_TEST_MODE)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Any loading or validation error is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AdminConfig, LimitsConfig, ListenerConfig, Mode, ObservabilityConfig, ProtocolConfig,
    ProxyConfig, SimulatorConfig, TimeoutConfig,
};
