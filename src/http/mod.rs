//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, layers, body collection)
//!     → request.rs (request ID)
//!     → [routing layer picks the handler list]
//!     → chain.rs (run handlers in order until one stops)
//!     → response.rs (status, headers, buffered body)
//!     → Send to client
//! ```

pub mod chain;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use chain::Chain;
pub use handler::{handler_fn, not_found, BoxedHandler, Handler, HandlerFn, NotFound};
pub use request::{request_id, RequestUuid, X_REQUEST_ID};
pub use response::ResponseWriter;
pub use server::{HttpServer, RouterReloader, ServerError, ServerHandle};
