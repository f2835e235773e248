//! Path-pattern HTTP router with middleware chains.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::Router ──▶ http::Chain ──▶ handlers
//!                     (axum + layers)  (first match wins)   (advance/stop)
//!
//!     Cross-cutting: config (TOML, hot reload), observability (tracing,
//!     metrics), lifecycle (signals, graceful shutdown), net (TLS)
//! ```
//!
//! Routes are registered on a [`RouterBuilder`], frozen into an immutable
//! [`Router`], and served by [`HttpServer`]. Each matched route carries an
//! ordered list of [`Handler`]s that run through a [`Chain`].

pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::AppConfig;
pub use http::{handler_fn, BoxedHandler, Chain, Handler, HttpServer, ResponseWriter};
pub use lifecycle::Shutdown;
pub use routing::{HandlerRegistry, MatchMode, QueryParams, Router, RouterBuilder};
