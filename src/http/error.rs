//! Per-request failure taxonomy and its mapping to HTTP responses.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::security::cors;

/// Failure while forwarding a request.
///
/// Every variant becomes a `502 Bad Gateway` with a plain-text body and the
/// CORS allow-origin header, so cross-origin browser callers can read it.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connect, DNS, TLS or protocol failure.
    #[error("upstream unreachable: {source}")]
    UpstreamUnreachable {
        #[source]
        source: reqwest::Error,
    },

    /// The client's request body failed mid-transfer (disconnect). Not an
    /// upstream fault; the response is never read.
    #[error("client aborted request body: {source}")]
    ClientAborted {
        #[source]
        source: reqwest::Error,
    },

    /// No response headers arrived within the configured window.
    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),
}

impl ProxyError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable { source } if source.is_connect() => "connect",
            ProxyError::UpstreamUnreachable { .. } => "request",
            ProxyError::ClientAborted { .. } => "client_abort",
            ProxyError::UpstreamTimeout(_) => "timeout",
        }
    }

    /// True when the failure came from the caller, not the upstream.
    pub fn is_client_abort(&self) -> bool {
        matches!(self, ProxyError::ClientAborted { .. })
    }

    /// Full message including the underlying cause chain.
    pub fn message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self).and_then(|e| e.source());
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = format!("Proxy request failed: {}", self.message());
        let mut response = (StatusCode::BAD_GATEWAY, body).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(cors::ALLOW_ORIGIN),
        );
        response
    }
}
