//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handlers, registry loop, expiry timers:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every request span
//! - Reply ids appear as a `reply_id` field wherever one is known
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
