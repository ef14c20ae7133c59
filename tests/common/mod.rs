//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use axum::Router;
use origin_relay::config::ProxyConfig;
use origin_relay::http::HttpServer;
use origin_relay::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// What the mock upstream received.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// Every request is recorded on the returned channel, then answered by `respond`.
pub async fn start_upstream<F, Fut>(respond: F) -> (SocketAddr, mpsc::UnboundedReceiver<Captured>)
where
    F: Fn(Captured) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    let app = Router::new().fallback(move |request: Request| {
        let tx = tx.clone();
        let respond = respond.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
            let captured = Captured {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
            };
            let _ = tx.send(captured.clone());
            respond(captured).await
        }
    });

    (serve_upstream(app).await, rx)
}

/// Serve an arbitrary router as the upstream on an ephemeral port.
pub async fn serve_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Upstream that writes `response` verbatim to every connection once the
/// request head has arrived, then closes.
#[allow(dead_code)]
pub async fn start_raw_upstream(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

/// Send raw bytes to `addr` and read until the peer closes.
#[allow(dead_code)]
pub async fn raw_exchange(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Mock upstream answering every request with a fixed body.
#[allow(dead_code)]
pub async fn start_static_upstream(body: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    start_upstream(move |_| async move { Response::new(Body::from(body)) }).await
}

/// Start the proxy in front of `upstream_url` with otherwise default config.
#[allow(dead_code)]
pub async fn spawn_proxy(upstream_url: String) -> (SocketAddr, Shutdown) {
    let mut config = ProxyConfig::default();
    config.upstream.url = upstream_url;
    spawn_proxy_with(config).await
}

/// Start the proxy with an explicit config on an ephemeral port.
pub async fn spawn_proxy_with(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never follows redirects and ignores environment proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
