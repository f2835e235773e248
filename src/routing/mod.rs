//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     template + methods
//!     → pattern.rs (split into segments)
//!     → route.rs (pattern + match mode + handlers)
//!     → router.rs RouterBuilder (method → ordered routes)
//!     → freeze() → immutable Router
//!
//! Incoming Request (method, path, query):
//!     → router.rs (candidates for the method, in order)
//!     → route.rs (segment-by-segment match, captures)
//!     → Return: handler list (or the 404 handler)
//!     → query.rs (captures appended to the query string)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - First match wins, no specificity ranking
//! - No regex: matching is a linear walk over segments
//! - Reloading replaces the whole frozen router

pub mod pattern;
pub mod query;
pub mod registry;
pub mod route;
pub mod router;

pub use pattern::Pattern;
pub use query::QueryParams;
pub use registry::HandlerRegistry;
pub use route::{MatchMode, Route};
pub use router::{Resolved, RouteError, RouteHandle, RouteId, RouteInfo, Router, RouterBuilder};
