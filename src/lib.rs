//! Correlating reverse proxy.
//!
//! Forwards client POSTs to a downstream service. The downstream may answer
//! at once, or defer by returning a reply id and completing the exchange
//! later through a separate callback request. The proxy holds the client
//! connection open until that completion arrives or the advertised reply
//! window elapses, in which case the client gets a 504.

// Core subsystems
pub mod config;
pub mod correlation;
pub mod forward;
pub mod http;
pub mod protocol;
pub mod simulator;

// Cross-cutting concerns
pub mod admin;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use correlation::{PendingResponse, Registry, RegistryHandle, ReplyId};
pub use error::{ProxyError, ServerError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
