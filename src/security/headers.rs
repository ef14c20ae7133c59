//! Header deny lists.
//!
//! # Responsibilities
//! - Strip headers that would leak the client's or proxy's identity upstream
//! - Strip hop-by-hop headers in both directions
//! - Strip upstream security policy that no longer matches the proxy's origin

use axum::http::HeaderName;

/// Request headers never forwarded upstream. `Host` is replaced separately.
pub const REQUEST_DENYLIST: &[&str] = &[
    "host",
    "origin",
    "referer",
    "x-forwarded-for",
    "x-forwarded-proto",
    "x-forwarded-host",
    "x-real-ip",
    "connection",
    "upgrade",
    "proxy-connection",
];

/// Upstream response headers whose policy would reject the proxy's own origin.
pub const RESPONSE_DENYLIST: &[&str] = &[
    "content-security-policy",
    "x-frame-options",
    "strict-transport-security",
];

/// Connection-level headers; the proxy's transport frames the response itself.
pub const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Returns true if `name` appears in `list`.
pub fn is_listed(name: &HeaderName, list: &[&str]) -> bool {
    list.contains(&name.as_str())
}
