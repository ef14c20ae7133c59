//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! upstream.url (config, read once at startup)
//!     → origin.rs (parse & normalize into UpstreamOrigin)
//!     → shared via Arc with every request handler
//!
//! Per request:
//!     http::proxy builds reqwest::Request
//!     → client.rs (pooled reqwest::Client, redirects disabled)
//!     → upstream server
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream; no selection, no retries
//! - Origin is immutable after startup and passed explicitly to transformers
//! - Redirects are surfaced to the proxy so `Location` can be rewritten

pub mod client;
pub mod origin;

pub use client::build_client;
pub use origin::{OriginError, UpstreamOrigin};
