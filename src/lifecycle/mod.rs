//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → metrics exporter → bind listener → HttpServer::run
//!
//! Shutdown (shutdown.rs):
//!     OS signal or Shutdown::trigger → stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal
//! - Waiting clients are drained, not cancelled; their expiry timers bound
//!   how long that takes
//! - Pending reply ids are not persisted across restarts

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::run;
