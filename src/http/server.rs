//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with a single fallback that feeds the router
//! - Wire up middleware (tracing, timeout, request ID, compression)
//! - Bind the HTTP and HTTPS listeners and serve them concurrently
//! - Bound header read time and idle time per connection
//! - Swap in a freshly frozen router on reload
//! - Stop gracefully on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_server::tls_rustls::RustlsAcceptor;
use axum_server::Handle;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_http::CompressionLevel;

use crate::config::AppConfig;
use crate::http::chain::Chain;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::ResponseWriter;
use crate::net::connection::IdleTimeoutAcceptor;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::routing::Router;

/// Errors raised while starting or running the listeners.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("no listener configured")]
    NoListeners,

    #[error("https listener configured without [tls] settings")]
    MissingTls,

    #[error("invalid listen address {0:?}")]
    Address(String),

    #[error("TLS setup failed: {0}")]
    Tls(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("listener task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ArcSwap<Router>>,
    pub max_body_size: usize,
}

/// Replaces the live routing table.
#[derive(Clone)]
pub struct RouterReloader {
    router: Arc<ArcSwap<Router>>,
}

impl RouterReloader {
    /// Publish `router`; requests already dispatched keep the old table.
    pub fn swap(&self, router: Router) {
        tracing::info!(routes = router.len(), "Routing table replaced");
        self.router.store(Arc::new(router));
    }

    pub fn current(&self) -> Arc<Router> {
        self.router.load_full()
    }
}

/// Controls the running listeners from outside `run`.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    http: Handle,
    https: Handle,
    grace: Duration,
}

impl ServerHandle {
    /// Stop accepting and wait up to the shutdown deadline for in-flight requests.
    pub fn shutdown(&self) {
        self.http.graceful_shutdown(Some(self.grace));
        self.https.graceful_shutdown(Some(self.grace));
    }

    /// Stop immediately, dropping open connections.
    pub fn close(&self) {
        self.http.shutdown();
        self.https.shutdown();
    }

    /// Bound address of the plain HTTP listener once it is up.
    pub async fn http_addr(&self) -> Option<SocketAddr> {
        self.http.listening().await
    }

    /// Bound address of the HTTPS listener once it is up.
    pub async fn https_addr(&self) -> Option<SocketAddr> {
        self.https.listening().await
    }
}

/// HTTP server hosting a frozen router.
pub struct HttpServer {
    config: AppConfig,
    router: Arc<ArcSwap<Router>>,
    handle: ServerHandle,
}

impl HttpServer {
    pub fn new(config: AppConfig, router: Router) -> Self {
        let handle = ServerHandle {
            http: Handle::new(),
            https: Handle::new(),
            grace: Duration::from_secs(config.timeouts.shutdown_secs),
        };

        Self {
            config,
            router: Arc::new(ArcSwap::from_pointee(router)),
            handle,
        }
    }

    pub fn reloader(&self) -> RouterReloader {
        RouterReloader {
            router: self.router.clone(),
        }
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    pub fn app(&self) -> axum::Router {
        let state = AppState {
            router: self.router.clone(),
            max_body_size: self.config.security.max_body_size,
        };

        let mut app = axum::Router::new().fallback(dispatch).with_state(state);

        if self.config.compression.enabled {
            let level = CompressionLevel::Precise(self.config.compression.level as i32);
            app = app.layer(CompressionLayer::new().gzip(true).quality(level));
        }

        app.layer(SetResponseHeaderLayer::if_not_present(
            header::SERVER,
            HeaderValue::from_static(concat!("pathchain/", env!("CARGO_PKG_VERSION"))),
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            self.config.timeouts.request_secs,
        )))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = request_id(request).unwrap_or("-"),
            )
        }))
        .layer(set_request_id_layer())
    }

    /// Run every configured listener until `shutdown` fires or one fails.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let listener = &self.config.listener;
        let http = listener.http.as_deref().map(parse_addr).transpose()?;
        let https = listener.https.as_deref().map(parse_addr).transpose()?;

        if http.is_none() && https.is_none() {
            return Err(ServerError::NoListeners);
        }

        let tls = match https {
            Some(_) => {
                let tls = self.config.tls.as_ref().ok_or(ServerError::MissingTls)?;
                Some(load_tls_config(tls).await.map_err(ServerError::Tls)?)
            }
            None => None,
        };

        let app = self.app();
        let timeouts = &self.config.timeouts;
        let idle = IdleTimeoutAcceptor::new(Duration::from_secs(timeouts.idle_secs));
        let read = Duration::from_secs(timeouts.read_secs);
        let mut tasks = JoinSet::new();

        if let Some(addr) = http {
            tracing::info!(address = %addr, "HTTP listener starting");
            let mut server = axum_server::bind(addr)
                .acceptor(idle)
                .handle(self.handle.http.clone());
            limit_header_read(server.http_builder(), read);
            let service = app.clone().into_make_service();
            tasks.spawn(async move { server.serve(service).await });
        }

        if let (Some(addr), Some(tls)) = (https, tls) {
            tracing::info!(address = %addr, "HTTPS listener starting");
            let mut server = axum_server::bind(addr)
                .acceptor(RustlsAcceptor::new(tls).acceptor(idle))
                .handle(self.handle.https.clone());
            limit_header_read(server.http_builder(), read);
            let service = app.into_make_service();
            tasks.spawn(async move { server.serve(service).await });
        }

        let handle = self.handle.clone();
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!(grace_secs = handle.grace.as_secs(), "Draining connections");
                handle.shutdown();
            }
            Some(result) = tasks.join_next() => {
                if let Err(e) = flatten(result) {
                    tracing::error!(error = %e, "Listener failed");
                    handle.close();
                    return Err(e);
                }
            }
        }

        while let Some(result) = tasks.join_next().await {
            flatten(result)?;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Close HTTP/1 connections whose request headers take longer than `read`.
fn limit_header_read(builder: &mut auto::Builder<TokioExecutor>, read: Duration) {
    builder.http1().timer(TokioTimer::new()).header_read_timeout(read);
}

fn parse_addr(addr: &str) -> Result<SocketAddr, ServerError> {
    addr.parse().map_err(|_| ServerError::Address(addr.to_string()))
}

fn flatten(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    result??;
    Ok(())
}

/// Fallback handler: route the request and run its chain.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (mut parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                error = %e,
                limit = state.max_body_size,
                "Request body rejected"
            );
            metrics::record_request(parts.method.as_str(), 413, "none", false, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large\n").into_response();
        }
    };

    let resolved = state.router.load().dispatch(&parts.method, &mut parts.uri);
    let label = resolved.label().to_string();
    let unmatched = resolved.route.is_none();
    let method = parts.method.clone();

    tracing::debug!(
        method = %method,
        uri = %parts.uri,
        route = %label,
        handlers = resolved.handlers.len(),
        "Dispatching"
    );

    let mut chain = Chain::new(
        ResponseWriter::new(),
        Request::from_parts(parts, body),
        resolved.handlers,
    );
    chain.run();

    let response = chain.into_response();
    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        &label,
        unmatched,
        start,
    );
    response
}
