//! Correlation subsystem.
//!
//! # Data Flow
//! ```text
//! deferred forward ──register-wait──┐
//!                                   ▼
//! completion call ───deliver────▶ registry loop ──▶ waiter(s) ──▶ blocked request
//!                                   ▲
//! expiry timer ──────expire─────────┘
//! ```
//!
//! # Design Decisions
//! - One control loop owns the table; callers only send messages
//! - Timeout is a delivery of a synthetic 504 through the same mailbox
//! - No cancellation: an abandoned waiter stays until its id is delivered

pub mod expiry;
pub mod registry;
pub mod types;

pub use expiry::spawn_expiry;
pub use registry::{Registry, RegistryHandle};
pub use types::{PendingResponse, RegistryStats, ReplyId, Waiter};
