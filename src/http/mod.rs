//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → proxy.rs (orchestration)
//!         → request.rs (resolve target, filter headers, body policy)
//!         → upstream call (reqwest, redirects disabled)
//!         → response.rs (Location, Set-Cookie, deny list, CORS)
//!     → Stream to client
//!
//! Upstream failure:
//!     → error.rs (ProxyError → 502 text/plain + CORS)
//! ```

pub mod error;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use server::{AppState, HttpServer, ServerError, X_REQUEST_ID};
