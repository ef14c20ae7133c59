//! Request handling and transformation.
//!
//! # Responsibilities
//! - Map the inbound path and query onto the upstream's URL space
//! - Derive outbound request headers from inbound ones
//! - Decide whether the inbound body is forwarded
//!
//! # Design Decisions
//! - Pure functions; the upstream origin is passed in, never global
//! - Path and query are copied verbatim, no normalization
//! - Header values are never parsed, only filtered by name

use axum::http::{header, HeaderMap, Method, Uri};
use url::Url;

use crate::security::headers::{is_listed, REQUEST_DENYLIST};
use crate::upstream::UpstreamOrigin;

/// Build the upstream URL for an inbound request URI.
///
/// Scheme, host and port come from `origin`; path and query come from `uri`.
pub fn resolve_target(origin: &UpstreamOrigin, uri: &Uri) -> Url {
    let mut target = origin.base().clone();
    target.set_path(uri.path());
    target.set_query(uri.query());
    target
}

/// Whether the inbound body is forwarded. `GET` and `HEAD` never carry one.
pub fn forwards_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// Derive the outbound header map.
///
/// Denylisted headers are dropped, multi-valued headers keep every value,
/// and `Host` is set to the upstream authority. Framing headers are dropped
/// when no body is forwarded since the upstream would wait for bytes that
/// never arrive.
pub fn transform_request_headers(
    origin: &UpstreamOrigin,
    inbound: &HeaderMap,
    forwards_body: bool,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len());

    for (name, value) in inbound {
        if is_listed(name, REQUEST_DENYLIST) || name == header::TRANSFER_ENCODING {
            continue;
        }
        if !forwards_body && name == header::CONTENT_LENGTH {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    outbound.insert(header::HOST, origin.host_header().clone());
    outbound
}
