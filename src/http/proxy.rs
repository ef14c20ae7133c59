//! Per-request orchestration: resolve, forward, transform, stream back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes, HttpBody};
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use futures_util::{StreamExt, TryStreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::http::error::ProxyError;
use crate::http::request::{forwards_body, resolve_target, transform_request_headers};
use crate::http::response::{transform_response_headers, InboundOrigin};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Chunks buffered between the client connection and the upstream request.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// Catch-all handler. Upstream failures become a 502; nothing else fails.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::info!(method = %method, path = %path, "Proxy request");

    match forward(&state, request).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            response
        }
        Err(e) if e.is_client_abort() => {
            // The caller is gone; nobody reads this response.
            tracing::debug!(method = %method, path = %path, error = %e.message(), "Client aborted request body");
            e.into_response()
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e.message(), "Proxy request failed");
            metrics::record_upstream_error(e.kind());
            let response = e.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            response
        }
    }
}

/// Forward one request to the upstream and build the client response.
///
/// Either the complete transformed response head is returned or an error is,
/// before anything reaches the client. Bodies stream in both directions.
pub async fn forward(state: &AppState, request: Request) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let target = resolve_target(&state.origin, &parts.uri);
    let with_body = forwards_body(&parts.method);
    let headers = transform_request_headers(&state.origin, &parts.headers, with_body);
    let inbound = InboundOrigin::from_request(&parts.headers, &parts.uri);

    let client_aborted = Arc::new(AtomicBool::new(false));
    let mut upstream_request = reqwest::Request::new(parts.method, target.clone());
    *upstream_request.headers_mut() = headers;
    if with_body && body.size_hint().exact() != Some(0) {
        *upstream_request.body_mut() = Some(stream_body(body, client_aborted.clone()));
    }

    tracing::debug!(target = %target, "Forwarding to upstream");

    let upstream_response = tokio::time::timeout(
        state.response_timeout,
        state.client.execute(upstream_request),
    )
    .await
    .map_err(|_| ProxyError::UpstreamTimeout(state.response_timeout))?
    .map_err(|source| {
        if client_aborted.load(Ordering::Acquire) {
            ProxyError::ClientAborted { source }
        } else {
            ProxyError::UpstreamUnreachable { source }
        }
    })?;

    let status = upstream_response.status();
    let reason = upstream_response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .cloned();
    let headers = transform_response_headers(
        &state.origin,
        &target,
        inbound.as_ref(),
        upstream_response.headers(),
    );

    tracing::debug!(target = %target, status = %status, "Upstream responded");

    // Dropping this stream (client gone) drops the upstream connection with it.
    let body = upstream_response.bytes_stream().inspect_err(|e| {
        tracing::debug!(error = %e, "Upstream body aborted mid-stream");
    });

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    if let Some(reason) = reason {
        response.extensions_mut().insert(reason);
    }
    Ok(response)
}

/// Pump the inbound body into a `reqwest::Body` without buffering it.
///
/// The pump ends when the client body ends or errors, or when the upstream
/// request drops the receiving side. `aborted` is set before a client body
/// error is handed to the upstream request.
fn stream_body(body: Body, aborted: Arc<AtomicBool>) -> reqwest::Body {
    let (tx, rx) = mpsc::channel::<Result<Bytes, axum::Error>>(BODY_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut chunks = body.into_data_stream();
        while let Some(chunk) = chunks.next().await {
            let failed = chunk.is_err();
            if failed {
                aborted.store(true, Ordering::Release);
            }
            if tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
    });

    reqwest::Body::wrap_stream(ReceiverStream::new(rx))
}
