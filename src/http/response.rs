//! Response handling and transformation.
//!
//! # Responsibilities
//! - Rewrite `Location` so redirects stay on the proxy's origin
//! - Relax `Set-Cookie` scoping so cookies work under the proxy's host
//! - Drop upstream security policy and hop-by-hop headers
//! - Inject permissive CORS headers
//!
//! # Design Decisions
//! - Pure function of (upstream origin, target, inbound origin, headers)
//! - Rewrite failures fall back to the original value; they never fail the response
//! - Multi-valued headers (notably `Set-Cookie`) stay distinct entries

use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use url::{Position, Url};

use crate::security::cors::apply_cors;
use crate::security::headers::{is_listed, HOP_BY_HOP, RESPONSE_DENYLIST};
use crate::upstream::UpstreamOrigin;

/// Header carrying the scheme a fronting TLS terminator received.
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Scheme and authority the client used to reach the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundOrigin {
    scheme: String,
    authority: String,
}

impl InboundOrigin {
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
        }
    }

    /// Derive the inbound origin from request parts.
    ///
    /// The authority comes from `Host` (HTTP/1.1) or the URI (HTTP/2). The
    /// scheme comes from `X-Forwarded-Proto`, then the URI, then `http`.
    /// Returns `None` if no usable authority is present.
    pub fn from_request(headers: &HeaderMap, uri: &Uri) -> Option<Self> {
        let authority = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Authority>().ok())
            .or_else(|| uri.authority().cloned())?;

        let scheme = headers
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|s| s == "http" || s == "https")
            .or_else(|| uri.scheme_str().map(str::to_owned))
            .unwrap_or_else(|| "http".to_owned());

        Some(Self::new(scheme, authority.as_str()))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// Derive the outbound response headers from the upstream's.
///
/// `target` is the URL the request was sent to; relative `Location` values
/// resolve against it. Without an `inbound` origin, `Location` passes through.
pub fn transform_response_headers(
    upstream: &UpstreamOrigin,
    target: &Url,
    inbound: Option<&InboundOrigin>,
    headers: &HeaderMap,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(headers.len() + 3);

    for (name, value) in headers {
        if name == header::LOCATION {
            let value = inbound
                .and_then(|inbound| rewrite_location_header(value, upstream, target, inbound))
                .unwrap_or_else(|| value.clone());
            outbound.append(name.clone(), value);
        } else if name == header::SET_COOKIE {
            outbound.append(name.clone(), rewrite_cookie_header(value));
        } else if is_listed(name, RESPONSE_DENYLIST) || is_listed(name, HOP_BY_HOP) {
            continue;
        } else {
            outbound.append(name.clone(), value.clone());
        }
    }

    apply_cors(&mut outbound);
    outbound
}

fn rewrite_location_header(
    value: &HeaderValue,
    upstream: &UpstreamOrigin,
    target: &Url,
    inbound: &InboundOrigin,
) -> Option<HeaderValue> {
    let raw = std::str::from_utf8(value.as_bytes()).ok()?;
    let rewritten = rewrite_location(raw, upstream, target, inbound)?;
    HeaderValue::from_bytes(rewritten.as_bytes()).ok()
}

/// Map a redirect target from upstream space onto the inbound origin.
///
/// Returns `None` when the value cannot be parsed or points outside the
/// upstream origin; callers keep the original value in that case.
pub fn rewrite_location(
    location: &str,
    upstream: &UpstreamOrigin,
    target: &Url,
    inbound: &InboundOrigin,
) -> Option<String> {
    let resolved = match target.join(location) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(location = %location, error = %e, "Unparsable Location, passing through");
            return None;
        }
    };
    if !upstream.contains(&resolved) {
        return None;
    }
    Some(format!(
        "{}://{}{}",
        inbound.scheme,
        inbound.authority,
        &resolved[Position::BeforePath..]
    ))
}

fn rewrite_cookie_header(value: &HeaderValue) -> HeaderValue {
    std::str::from_utf8(value.as_bytes())
        .ok()
        .map(rewrite_set_cookie)
        .and_then(|cookie| HeaderValue::from_bytes(cookie.as_bytes()).ok())
        .unwrap_or_else(|| value.clone())
}

/// Rescope a `Set-Cookie` value to whatever host serves the proxy.
///
/// Drops `Domain` and `Secure`, forces `SameSite=Lax`. Attributes are
/// matched by name, case-insensitively and in any order; the leading
/// `name=value` pair is never touched.
pub fn rewrite_set_cookie(value: &str) -> String {
    let mut parts = value.split(';');
    let mut rewritten = parts.next().unwrap_or_default().trim().to_string();

    for attr in parts.map(str::trim).filter(|a| !a.is_empty()) {
        let name = attr.split('=').next().unwrap_or_default().trim();
        if name.eq_ignore_ascii_case("domain") || name.eq_ignore_ascii_case("secure") {
            continue;
        }
        rewritten.push_str("; ");
        if name.eq_ignore_ascii_case("samesite") {
            rewritten.push_str("SameSite=Lax");
        } else {
            rewritten.push_str(attr);
        }
    }

    rewritten
}
