//! Handler abstraction.
//!
//! A handler receives the execution chain of the current request. Through it
//! the handler reads or rewrites the request, writes the response, and decides
//! whether the rest of the chain runs (`stop`) or runs nested (`advance`).

use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::chain::Chain;

/// Something that can serve one step of a request.
pub trait Handler: Send + Sync {
    fn serve(&self, chain: &mut Chain);

    /// Type-erase into a shared handler.
    fn boxed(self) -> BoxedHandler
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

/// Shared, type-erased handler as stored on routes.
pub type BoxedHandler = Arc<dyn Handler>;

/// Handler backed by a closure. See [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Chain) + Send + Sync,
{
    fn serve(&self, chain: &mut Chain) {
        (self.f)(chain)
    }
}

/// Turn a closure into a handler.
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut Chain) + Send + Sync,
{
    HandlerFn { f }
}

/// Responds with `404 page not found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Handler for NotFound {
    fn serve(&self, chain: &mut Chain) {
        chain
            .response_mut()
            .text(StatusCode::NOT_FOUND, "404 page not found\n");
    }
}

/// The built-in fallback handler for unmatched requests.
pub fn not_found() -> BoxedHandler {
    Arc::new(NotFound)
}
