//! Failure injection tests for the proxy.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use futures_util::StreamExt;
use origin_relay::config::ProxyConfig;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

mod common;

/// Fires its channel when the upstream side of an exchange is torn down.
struct NotifyOnDrop(Option<oneshot::Sender<()>>);

impl Drop for NotifyOnDrop {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

type Slot = Arc<Mutex<Option<oneshot::Sender<()>>>>;

fn slot() -> (Slot, oneshot::Receiver<()>) {
    let (tx, rx) = oneshot::channel();
    (Arc::new(Mutex::new(Some(tx))), rx)
}

/// An address nothing is listening on.
async fn closed_addr() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn unreachable_upstream_yields_readable_502() {
    let (proxy, shutdown) = common::spawn_proxy(format!("http://{}", closed_addr().await)).await;

    let res = common::client()
        .post(format!("http://{proxy}/api"))
        .body("payload")
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 502);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body = res.text().await.unwrap();
    assert!(body.starts_with("Proxy request failed: upstream unreachable"), "body: {body}");

    shutdown.trigger();
}

#[tokio::test]
async fn slow_upstream_times_out_with_502() {
    let (upstream, _seen) = common::start_upstream(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Response::new(Body::from("too late"))
    })
    .await;

    let mut config = ProxyConfig::default();
    config.upstream.url = format!("http://{upstream}");
    config.timeouts.response_secs = 1;
    let (proxy, shutdown) = common::spawn_proxy_with(config).await;

    let res = common::client().get(format!("http://{proxy}/")).send().await.unwrap();

    assert_eq!(res.status(), 502);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(res.text().await.unwrap().contains("did not respond within"));

    shutdown.trigger();
}

#[tokio::test]
async fn slow_request_does_not_stall_others() {
    let (upstream, _seen) = common::start_upstream(|captured| async move {
        if captured.uri.path() == "/slow" {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        Response::new(Body::from(captured.uri.path().to_string()))
    })
    .await;
    let (proxy, shutdown) = common::spawn_proxy(format!("http://{upstream}")).await;
    let client = common::client();

    let slow = tokio::spawn({
        let client = client.clone();
        async move { client.get(format!("http://{proxy}/slow")).send().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let start = Instant::now();
    for _ in 0..10 {
        let res = client.get(format!("http://{proxy}/fast")).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), "/fast");
    }
    assert!(start.elapsed() < Duration::from_secs(2), "fast requests waited on the slow one");

    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow.text().await.unwrap(), "/slow");

    shutdown.trigger();
}

#[tokio::test]
async fn one_failure_does_not_affect_next_request() {
    let (upstream, _seen) = common::start_static_upstream("alive").await;
    let (good_proxy, good_shutdown) = common::spawn_proxy(format!("http://{upstream}")).await;
    let (bad_proxy, bad_shutdown) = common::spawn_proxy(format!("http://{}", closed_addr().await)).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client.get(format!("http://{bad_proxy}/")).send().await.unwrap();
        assert_eq!(res.status(), 502);

        let res = client.get(format!("http://{good_proxy}/")).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "alive");
    }

    good_shutdown.trigger();
    bad_shutdown.trigger();
}

#[tokio::test]
async fn client_upload_abort_releases_upstream() {
    let (slot, ended) = slot();
    let app = Router::new().fallback(move |request: Request| {
        let slot = slot.clone();
        async move {
            let _guard = NotifyOnDrop(slot.lock().unwrap().take());
            let mut chunks = request.into_body().into_data_stream();
            while let Some(Ok(_)) = chunks.next().await {}
            Response::new(Body::from("drained"))
        }
    });
    let upstream = common::serve_upstream(app).await;
    let (proxy, shutdown) = common::spawn_proxy(format!("http://{upstream}")).await;

    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream
        .write_all(b"POST /upload HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Length: 1000000\r\n\r\npartial body")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    drop(stream);

    let released = tokio::time::timeout(Duration::from_secs(5), ended).await;
    assert!(matches!(released, Ok(Ok(()))), "upstream upload was never released");

    shutdown.trigger();
}

#[tokio::test]
async fn client_download_abort_releases_upstream() {
    let (slot, ended) = slot();
    let app = Router::new().fallback(move || {
        let slot = slot.clone();
        async move {
            let guard = NotifyOnDrop(slot.lock().unwrap().take());
            let chunks = futures_util::stream::unfold((0u32, guard), |(n, guard)| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let chunk = Bytes::from(format!("chunk {n}\n"));
                Some((Ok::<_, std::io::Error>(chunk), (n + 1, guard)))
            });
            Response::new(Body::from_stream(chunks))
        }
    });
    let upstream = common::serve_upstream(app).await;
    let (proxy, shutdown) = common::spawn_proxy(format!("http://{upstream}")).await;

    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream
        .write_all(b"GET /stream HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n")
        .await
        .unwrap();
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    while !String::from_utf8_lossy(&received).contains("chunk 0") {
        let n = stream.read(&mut buf).await.unwrap();
        assert_ne!(n, 0, "proxy closed before the first chunk");
        received.extend_from_slice(&buf[..n]);
    }
    drop(stream);

    let released = tokio::time::timeout(Duration::from_secs(5), ended).await;
    assert!(matches!(released, Ok(Ok(()))), "upstream download was never released");

    shutdown.trigger();
}
