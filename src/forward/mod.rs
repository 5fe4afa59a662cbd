//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! POST without reply id → forwarder.rs → downstream
//!     final reply    → streamed back unchanged
//!     deferred reply → registry wait + expiry timer → completion or 504
//!
//! POST with reply id → completion.rs → registry deliver → 200 ack
//! ```

pub mod completion;
pub mod forwarder;

pub use completion::{complete, completion_id};
pub use forwarder::{http_client, Classification, Forwarder, HttpClient, Outcome};
