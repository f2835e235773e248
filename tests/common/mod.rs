//! Shared utilities for integration tests.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, Response};
use tower::ServiceExt;

use pathchain::config::{AppConfig, ListenerConfig};
use pathchain::http::{HttpServer, ServerHandle};
use pathchain::lifecycle::Shutdown;
use pathchain::routing::Router;

/// Config with a single plain HTTP listener on an ephemeral local port.
#[allow(dead_code)]
pub fn local_config() -> AppConfig {
    AppConfig {
        listener: ListenerConfig {
            http: Some("127.0.0.1:0".to_string()),
            https: None,
        },
        ..AppConfig::default()
    }
}

/// Start a server in the background and wait until it accepts connections.
#[allow(dead_code)]
pub async fn start_server(config: AppConfig, router: Router) -> (SocketAddr, ServerHandle, Shutdown) {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    let handle = server.handle();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(rx).await;
    });

    let addr = handle
        .http_addr()
        .await
        .expect("server did not start listening");
    (addr, handle, shutdown)
}

/// Send one request through the app without a socket.
#[allow(dead_code)]
pub async fn send(app: axum::Router, request: Request<Body>) -> (Response<Body>, String) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&bytes).into_owned();
    (Response::from_parts(parts, Body::empty()), text)
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
