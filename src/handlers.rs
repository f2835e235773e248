//! Named handlers shipped with the binary.
//!
//! Config routes refer to these by name:
//!
//! | name         | behavior                                              |
//! |--------------|-------------------------------------------------------|
//! | `hello`      | writes a greeting                                     |
//! | `params`     | echoes every query pair, captures included            |
//! | `log`        | logs the request, runs the rest, logs the status      |
//! | `deny`       | answers 403 and stops the chain                       |
//! | `request_id` | echoes the request ID                                 |

use axum::http::{header, HeaderValue, StatusCode};

use crate::http::{request_id, Chain, Handler};
use crate::routing::HandlerRegistry;

/// Writes `Hello, world!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hello;

impl Handler for Hello {
    fn serve(&self, chain: &mut Chain) {
        chain.response_mut().text(StatusCode::OK, "Hello, world!\n");
    }
}

/// Echoes the query string as `key=value` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoParams;

impl Handler for EchoParams {
    fn serve(&self, chain: &mut Chain) {
        let query = chain.query();
        let response = chain.response_mut();
        response.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        for (key, value) in query.iter() {
            response.write_str(&format!("{key}={value}\n"));
        }
    }
}

/// Wraps the rest of the chain with a pair of log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequest;

impl Handler for LogRequest {
    fn serve(&self, chain: &mut Chain) {
        let method = chain.request().method().clone();
        let uri = chain.request().uri().clone();
        tracing::info!(method = %method, uri = %uri, "Request received");

        chain.run();

        tracing::info!(
            method = %method,
            uri = %uri,
            status = chain.response().status().as_u16(),
            "Request handled"
        );
    }
}

/// Refuses the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deny;

impl Handler for Deny {
    fn serve(&self, chain: &mut Chain) {
        chain.response_mut().text(StatusCode::FORBIDDEN, "403 forbidden\n");
        chain.stop();
    }
}

/// Writes the request ID assigned to this request.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoRequestId;

impl Handler for EchoRequestId {
    fn serve(&self, chain: &mut Chain) {
        let id = request_id(chain.request()).unwrap_or("-").to_string();
        chain.response_mut().text(StatusCode::OK, &format!("{id}\n"));
    }
}

/// Registry holding every built-in handler under its config name.
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("hello", Hello)
        .register("params", EchoParams)
        .register("log", LogRequest)
        .register("deny", Deny)
        .register("request_id", EchoRequestId);
    registry
}
