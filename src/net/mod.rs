//! Network layer.
//!
//! Listener binding is handled by `axum-server`; this module prepares the
//! TLS material and the per-connection idle deadline for both listeners.

pub mod connection;
pub mod tls;

pub use connection::{IdleStream, IdleTimeoutAcceptor};
pub use tls::load_tls_config;
