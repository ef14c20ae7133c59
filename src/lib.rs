//! Transparent single-upstream reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                    ORIGIN RELAY                       │
//!                   │                                                       │
//!   Client Request  │  ┌──────────┐   ┌────────────────┐   ┌────────────┐  │
//!   ────────────────┼─▶│  server  │──▶│ request.rs     │──▶│  upstream  │──┼──▶ Upstream
//!                   │  │ (axum)   │   │ target+headers │   │  (reqwest) │  │    Origin
//!                   │  └──────────┘   └────────────────┘   └─────┬──────┘  │
//!                   │                                            │         │
//!   Client Response │  ┌──────────┐   ┌────────────────┐         │         │
//!   ◀───────────────┼──│ streamed │◀──│ response.rs    │◀────────┘         │
//!                   │  │   body   │   │ cookie/loc/CORS│                   │
//!                   │  └──────────┘   └────────────────┘                   │
//!                   │                                                       │
//!                   │  config · observability · security · lifecycle        │
//!                   └──────────────────────────────────────────────────────┘
//! ```
//!
//! Every request is handled independently; the only shared state is the
//! read-only upstream origin and the upstream connection pool.

pub mod config;
pub mod http;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::UpstreamOrigin;
