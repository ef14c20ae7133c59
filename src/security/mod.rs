//! Header policy subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request:
//!     → headers.rs (strip client/proxy identity + hop-by-hop headers)
//!
//! Outbound response:
//!     → headers.rs (strip upstream security policy + hop-by-hop headers)
//!     → cors.rs (unconditional permissive CORS)
//! ```
//!
//! # Design Decisions
//! - Fixed lists, no configuration: the proxy's transparency contract is static
//! - Header names are compared lowercase (`HeaderName` is always normalized)

pub mod cors;
pub mod headers;
