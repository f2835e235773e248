//! Per-request execution chain.
//!
//! # Responsibilities
//! - Hold the request, the response sink and the handlers still to run
//! - Run exactly one handler per `advance`
//! - Let a handler cut the chain short with `stop`
//!
//! # Design Decisions
//! - Handlers get the chain as an argument; there is no ambient lookup
//! - Single-threaded and cooperative: each handler runs to completion
//! - Panics in handlers are not caught here

use std::collections::VecDeque;

use axum::body::Bytes;
use axum::http::Request;
use axum::response::Response;

use crate::http::handler::BoxedHandler;
use crate::http::response::ResponseWriter;
use crate::routing::QueryParams;

/// Cursor over the matched handler list of one request.
pub struct Chain {
    response: ResponseWriter,
    request: Request<Bytes>,
    pending: VecDeque<BoxedHandler>,
}

impl Chain {
    pub fn new(
        response: ResponseWriter,
        request: Request<Bytes>,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Self {
        Self {
            response,
            request,
            pending: handlers.into_iter().collect(),
        }
    }

    /// Run the next handler.
    ///
    /// Returns `false` without doing anything once no handlers remain,
    /// `true` after a handler ran.
    pub fn advance(&mut self) -> bool {
        let Some(handler) = self.pending.pop_front() else {
            return false;
        };

        tracing::trace!(remaining = self.pending.len(), "Running handler");
        handler.serve(self);
        true
    }

    /// Drop every handler that has not run yet.
    pub fn stop(&mut self) {
        if !self.pending.is_empty() {
            tracing::trace!(skipped = self.pending.len(), "Chain stopped");
        }
        self.pending.clear();
    }

    /// Drive the chain until it is exhausted or stopped.
    pub fn run(&mut self) {
        while self.advance() {}
    }

    /// Number of handlers that have not run yet.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// Mutable access to the request; changes are visible to every handler
    /// that runs afterwards.
    pub fn request_mut(&mut self) -> &mut Request<Bytes> {
        &mut self.request
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Query parameters of the request, including route captures.
    pub fn query(&self) -> QueryParams {
        QueryParams::parse(self.request.uri().query())
    }

    /// Split the chain back into the request and the written response.
    pub fn into_parts(self) -> (Request<Bytes>, ResponseWriter) {
        (self.request, self.response)
    }

    pub fn into_response(self) -> Response {
        self.response.into_response()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;

    use crate::http::handler::{handler_fn, Handler};

    fn request(uri: &str) -> Request<Bytes> {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> BoxedHandler {
        let log = log.clone();
        handler_fn(move |_chain| log.lock().unwrap().push(name)).boxed()
    }

    #[test]
    fn test_advance_runs_every_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handlers = vec![recorder(&log, "a"), recorder(&log, "b"), recorder(&log, "c")];
        let mut chain = Chain::new(ResponseWriter::new(), request("/"), handlers);

        let mut count = 0;
        while chain.advance() {
            count += 1;
        }

        assert_eq!(count, 3);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(!chain.advance());
    }

    #[test]
    fn test_stop_skips_remaining() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stopper = {
            let log = log.clone();
            handler_fn(move |chain| {
                log.lock().unwrap().push("b");
                chain.response_mut().text(StatusCode::FORBIDDEN, "denied");
                chain.stop();
            })
            .boxed()
        };
        let handlers = vec![recorder(&log, "a"), stopper, recorder(&log, "c")];
        let mut chain = Chain::new(ResponseWriter::new(), request("/"), handlers);
        chain.run();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
        assert!(chain.is_finished());
        assert_eq!(chain.response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_nested_advance_wraps_later_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let wrapper = {
            let log = log.clone();
            handler_fn(move |chain| {
                log.lock().unwrap().push("before");
                chain.advance();
                log.lock().unwrap().push("after");
            })
            .boxed()
        };
        let handlers = vec![wrapper, recorder(&log, "inner"), recorder(&log, "last")];
        let mut chain = Chain::new(ResponseWriter::new(), request("/"), handlers);
        chain.run();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["before", "inner", "after", "last"]
        );
    }

    #[test]
    fn test_request_changes_reach_later_handlers() {
        let seen = Arc::new(Mutex::new(None));
        let rewrite = handler_fn(|chain| {
            *chain.request_mut().uri_mut() = "/x?user=alice".parse().unwrap();
        })
        .boxed();
        let read = {
            let seen = seen.clone();
            handler_fn(move |chain| {
                *seen.lock().unwrap() = chain.query().get("user").map(str::to_string);
            })
            .boxed()
        };
        let mut chain = Chain::new(ResponseWriter::new(), request("/"), vec![rewrite, read]);
        chain.run();

        assert_eq!(seen.lock().unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn test_empty_chain_is_terminal() {
        let mut chain = Chain::new(ResponseWriter::new(), request("/"), Vec::new());
        assert!(!chain.advance());
        chain.stop();
        assert_eq!(chain.remaining(), 0);
    }
}
