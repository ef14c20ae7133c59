//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request produces:
//!     → logging.rs (structured log events: method, path, failures)
//!     → metrics.rs (request counters, latency histogram, upstream errors)
//!     → tower_http TraceLayer spans carrying the x-request-id
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) available for machine parsing
//! - Metrics calls are cheap no-ops when no exporter is installed

pub mod logging;
pub mod metrics;
