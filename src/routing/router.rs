//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Register patterns per method and collect their handlers
//! - Freeze the table into an immutable `Router`
//! - Resolve method + path to a handler list (not-found fallback included)
//!
//! # Design Decisions
//! - Two phases: `RouterBuilder` is mutable, `Router` is not
//! - Routes are tried in registration order; first match wins
//! - A route with no handlers at freeze time answers 404
//! - Captures are appended to the query, never replacing existing parameters

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::uri::PathAndQuery;
use axum::http::{Method, Uri};
use serde::Serialize;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::http::handler::{not_found, BoxedHandler, Handler};
use crate::routing::pattern::{split_path, Pattern};
use crate::routing::query::{self, QueryParams};
use crate::routing::registry::HandlerRegistry;
use crate::routing::route::{Capture, MatchMode, Route};

/// Errors raised while building a router.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// A handler name did not resolve to a registered handler.
    #[error("handler `{0}` is not a registered handler")]
    HandlerType(String),

    /// A method name is not a valid HTTP method token.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),
}

/// Stable identifier of a route inside a `RouterBuilder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(usize);

/// Mutable router under construction.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<(Route, Vec<Method>)>,
    table: HashMap<Method, Vec<usize>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern for `methods` with the given match mode.
    ///
    /// The same route is shared by every listed method; attaching handlers to
    /// the returned handle affects all of them.
    pub fn route(&mut self, pattern: &str, methods: &[Method], mode: MatchMode) -> RouteHandle<'_> {
        let id = self.routes.len();
        let mut registered = Vec::with_capacity(methods.len());

        for method in methods {
            if registered.contains(method) {
                continue;
            }
            self.table.entry(method.clone()).or_default().push(id);
            registered.push(method.clone());
        }

        tracing::debug!(
            pattern = %pattern,
            methods = ?registered,
            mode = ?mode,
            "Route registered"
        );

        self.routes
            .push((Route::new(Pattern::compile(pattern), mode), registered));
        RouteHandle {
            id: RouteId(id),
            route: &mut self.routes[id].0,
        }
    }

    /// Register a route whose path must have exactly as many segments as the
    /// pattern (a trailing `*` excepted).
    pub fn strict_route(&mut self, pattern: &str, methods: &[Method]) -> RouteHandle<'_> {
        self.route(pattern, methods, MatchMode::Strict)
    }

    /// Register a route that also matches longer paths.
    pub fn weak_route(&mut self, pattern: &str, methods: &[Method]) -> RouteHandle<'_> {
        self.route(pattern, methods, MatchMode::Weak)
    }

    /// Re-open a previously registered route.
    pub fn route_mut(&mut self, id: RouteId) -> Option<RouteHandle<'_>> {
        self.routes.get_mut(id.0).map(|(route, _)| RouteHandle { id, route })
    }

    /// Register the routes declared in configuration, resolving handler names
    /// through `registry`.
    ///
    /// Stops at the first invalid method or unknown handler name. Routes and
    /// handlers registered before the failure stay registered.
    pub fn extend_from_config(
        &mut self,
        routes: &[RouteConfig],
        registry: &HandlerRegistry,
    ) -> Result<(), RouteError> {
        for config in routes {
            let methods = config
                .methods
                .iter()
                .map(String::as_str)
                .map(parse_method)
                .collect::<Result<Vec<_>, _>>()?;

            let mode = if config.strict {
                MatchMode::Strict
            } else {
                MatchMode::Weak
            };

            let mut handle = self.route(&config.pattern, &methods, mode);
            if let Some(name) = &config.name {
                handle.name(name);
            }
            handle.attach_named(registry, config.handlers.as_slice())?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finish registration.
    pub fn freeze(self) -> Router {
        let routes: Vec<(Arc<Route>, Vec<Method>)> = self
            .routes
            .into_iter()
            .map(|(mut route, methods)| {
                if route.handlers().is_empty() {
                    tracing::debug!(
                        route = %route.label(),
                        "Route has no handlers, answering 404"
                    );
                    route.push_handler(not_found());
                }
                (Arc::new(route), methods)
            })
            .collect();

        let table = self
            .table
            .into_iter()
            .map(|(method, ids)| {
                let chain = ids.into_iter().map(|id| routes[id].0.clone()).collect();
                (method, chain)
            })
            .collect();

        tracing::info!(routes = routes.len(), "Router frozen");
        Router { routes, table }
    }
}

fn parse_method(name: &str) -> Result<Method, RouteError> {
    Method::from_bytes(name.as_bytes()).map_err(|_| RouteError::InvalidMethod(name.to_string()))
}

/// Handle to a registered route, used to attach handlers.
pub struct RouteHandle<'a> {
    id: RouteId,
    route: &'a mut Route,
}

impl RouteHandle<'_> {
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Name the route for logs and metrics.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.route.set_name(name);
        self
    }

    /// Append a handler. Handlers run in attachment order.
    pub fn attach<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.attach_boxed(handler.boxed())
    }

    pub fn attach_boxed(&mut self, handler: BoxedHandler) -> &mut Self {
        self.route.push_handler(handler);
        self
    }

    /// Append several handlers at once, keeping their order.
    pub fn attach_all(&mut self, handlers: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
        for handler in handlers {
            self.attach_boxed(handler);
        }
        self
    }

    /// Append handlers by registry name, in order.
    ///
    /// Fails with [`RouteError::HandlerType`] on the first unknown name;
    /// handlers appended before it are kept, the ones after it are not.
    pub fn attach_named<S>(&mut self, registry: &HandlerRegistry, names: &[S]) -> Result<&mut Self, RouteError>
    where
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            let handler = registry
                .get(name)
                .ok_or_else(|| RouteError::HandlerType(name.to_string()))?;
            self.route.push_handler(handler);
        }
        Ok(self)
    }

    pub fn handler_count(&self) -> usize {
        self.route.handlers().len()
    }
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Arc<Route>,
    pub captures: Vec<Capture>,
}

/// Outcome of dispatching a request.
pub struct Resolved {
    /// The matched route, `None` when the not-found fallback was used.
    pub route: Option<Arc<Route>>,
    /// Handlers to run, never empty.
    pub handlers: Vec<BoxedHandler>,
}

impl Resolved {
    /// Label for logs and metrics.
    pub fn label(&self) -> &str {
        self.route.as_deref().map(Route::label).unwrap_or("none")
    }
}

/// Summary of a route for listings.
#[derive(Debug, Clone, Serialize)]
pub struct RouteInfo {
    pub name: Option<String>,
    pub pattern: String,
    pub methods: Vec<String>,
    pub mode: MatchMode,
    pub handlers: usize,
}

/// Frozen, shareable routing table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<(Arc<Route>, Vec<Method>)>,
    table: HashMap<Method, Vec<Arc<Route>>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Build a router from configured routes only.
    pub fn from_config(routes: &[RouteConfig], registry: &HandlerRegistry) -> Result<Self, RouteError> {
        let mut builder = RouterBuilder::new();
        builder.extend_from_config(routes, registry)?;
        Ok(builder.freeze())
    }

    /// First route registered for `method` that matches `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let candidates = self.table.get(method)?;
        let segments = split_path(path);

        let mut captures = Vec::new();
        candidates
            .iter()
            .find(|route| route.matches(&segments, &mut captures))
            .map(|route| RouteMatch { route, captures })
    }

    /// Resolve `method` + `path` to the handlers to run, adding captures to
    /// `query`. Unmatched requests get the not-found handler.
    pub fn resolve(&self, method: &Method, path: &str, query: &mut QueryParams) -> Vec<BoxedHandler> {
        match self.lookup(method, path) {
            Some(found) => {
                query.extend(found.captures);
                found.route.handlers().to_vec()
            }
            None => vec![not_found()],
        }
    }

    /// Resolve a request and write captures into its URI query string.
    pub fn dispatch(&self, method: &Method, uri: &mut Uri) -> Resolved {
        let Some(found) = self.lookup(method, uri.path()) else {
            tracing::debug!(method = %method, path = %uri.path(), "No route matched");
            return Resolved {
                route: None,
                handlers: vec![not_found()],
            };
        };

        if !found.captures.is_empty() {
            match with_captures(uri, &found.captures) {
                Some(rewritten) => *uri = rewritten,
                None => tracing::warn!(
                    uri = %uri,
                    route = %found.route.label(),
                    "Could not write captures into the query string"
                ),
            }
        }

        tracing::trace!(route = %found.route.label(), "Route matched");
        Resolved {
            route: Some(found.route.clone()),
            handlers: found.route.handlers().to_vec(),
        }
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = RouteInfo> + '_ {
        self.routes.iter().map(|(route, methods)| RouteInfo {
            name: route.name().map(str::to_string),
            pattern: route.pattern().template().to_string(),
            methods: methods.iter().map(ToString::to_string).collect(),
            mode: route.mode(),
            handlers: route.handlers().len(),
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn with_captures(uri: &Uri, captures: &[Capture]) -> Option<Uri> {
    let query = query::append_to_raw(uri.query(), captures)?;
    let path_and_query: PathAndQuery = format!("{}?{}", uri.path(), query).parse().ok()?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum::body::Bytes;
    use axum::http::{Request, StatusCode};

    use crate::http::chain::Chain;
    use crate::http::handler::handler_fn;
    use crate::http::response::ResponseWriter;

    fn tag(name: &'static str) -> impl Handler {
        handler_fn(move |chain: &mut Chain| chain.response_mut().write_str(name))
    }

    fn run(router: &Router, method: Method, uri: &str) -> (StatusCode, String, Uri) {
        let mut uri: Uri = uri.parse().unwrap();
        let resolved = router.dispatch(&method, &mut uri);
        let request = Request::builder()
            .method(method)
            .uri(uri.clone())
            .body(Bytes::new())
            .unwrap();
        let mut chain = Chain::new(ResponseWriter::new(), request, resolved.handlers);
        chain.run();
        let (_, response) = chain.into_parts();
        (
            response.status(),
            String::from_utf8(response.body().to_vec()).unwrap(),
            uri,
        )
    }

    #[test]
    fn test_first_match_wins() {
        let mut builder = Router::builder();
        builder.strict_route("/users/*", &[Method::GET]).attach(tag("wildcard"));
        builder.strict_route("/users/me", &[Method::GET]).attach(tag("me"));
        let router = builder.freeze();

        let (_, body, _) = run(&router, Method::GET, "/users/me");
        assert_eq!(body, "wildcard");
    }

    #[test]
    fn test_specific_before_wildcard() {
        let mut builder = Router::builder();
        builder.strict_route("/users/me", &[Method::GET]).attach(tag("me"));
        builder.strict_route("/users/*", &[Method::GET]).attach(tag("wildcard"));
        let router = builder.freeze();

        assert_eq!(run(&router, Method::GET, "/users/me").1, "me");
        assert_eq!(run(&router, Method::GET, "/users/you").1, "wildcard");
    }

    #[test]
    fn test_unmatched_gets_not_found() {
        let router = Router::builder().freeze();
        let mut query = QueryParams::new();
        let handlers = router.resolve(&Method::GET, "/nope", &mut query);
        assert_eq!(handlers.len(), 1);

        let (status, body, _) = run(&router, Method::GET, "/nope");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 page not found\n");
    }

    #[test]
    fn test_methods_are_separate() {
        let mut builder = Router::builder();
        builder.strict_route("/items", &[Method::POST]).attach(tag("create"));
        let router = builder.freeze();

        assert_eq!(run(&router, Method::POST, "/items").1, "create");
        assert_eq!(run(&router, Method::GET, "/items").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_route_shared_across_methods() {
        let mut builder = Router::builder();
        let id = builder
            .strict_route("/items", &[Method::GET, Method::PUT, Method::GET])
            .id();
        builder.route_mut(id).unwrap().attach(tag("items"));
        let router = builder.freeze();

        assert_eq!(router.len(), 1);
        assert_eq!(run(&router, Method::GET, "/items").1, "items");
        assert_eq!(run(&router, Method::PUT, "/items").1, "items");
        assert_eq!(router.routes().next().unwrap().methods, vec!["GET", "PUT"]);
    }

    #[test]
    fn test_unattached_route_answers_not_found() {
        let mut builder = Router::builder();
        builder.strict_route("/later", &[Method::GET]);
        builder.strict_route("/later", &[Method::GET]).attach(tag("shadowed"));
        let router = builder.freeze();

        assert_eq!(run(&router, Method::GET, "/later").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_attachments_accumulate() {
        let mut builder = Router::builder();
        let id = builder.strict_route("/", &[Method::GET]).attach(tag("a")).id();
        builder.route_mut(id).unwrap().attach(tag("b")).attach(tag("c"));
        let router = builder.freeze();

        assert_eq!(run(&router, Method::GET, "/").1, "abc");
    }

    #[test]
    fn test_attach_all_keeps_order() {
        let shared = tag("s").boxed();
        let mut builder = Router::builder();
        builder
            .strict_route("/", &[Method::GET])
            .attach_boxed(shared.clone())
            .attach_all([tag("a").boxed(), tag("b").boxed(), shared]);
        builder
            .strict_route("/empty", &[Method::GET])
            .attach_all(Vec::new());
        let router = builder.freeze();

        assert_eq!(run(&router, Method::GET, "/").1, "sabs");
        assert_eq!(run(&router, Method::GET, "/empty").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_captures_resolve_into_query() {
        let mut builder = Router::builder();
        builder.strict_route("/users/:id/:action", &[Method::GET]).attach(tag("ok"));
        let router = builder.freeze();

        let mut query = QueryParams::parse(Some("force=1"));
        router.resolve(&Method::GET, "/users/42/ban", &mut query);
        assert_eq!(query.encode(), "force=1&id=42&action=ban");
    }

    #[test]
    fn test_dispatch_appends_captures_to_uri() {
        let mut builder = Router::builder();
        builder.strict_route("/users/:id", &[Method::GET]).attach(tag("ok"));
        let router = builder.freeze();

        let (_, _, uri) = run(&router, Method::GET, "/users/42");
        assert_eq!(uri.query(), Some("id=42"));

        let (_, _, uri) = run(&router, Method::GET, "/users/42?sort=desc");
        assert_eq!(uri.query(), Some("sort=desc&id=42"));
        assert_eq!(uri.path(), "/users/42");
    }

    #[test]
    fn test_captures_visible_to_handlers() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let record = {
            let seen = seen.clone();
            handler_fn(move |chain: &mut Chain| {
                let query = chain.query();
                seen.lock().unwrap().push((
                    query.get("id").map(str::to_string),
                    query.get("action").map(str::to_string),
                ));
            })
        };
        let mut builder = Router::builder();
        builder
            .strict_route("/users/:id/:action", &[Method::GET])
            .attach(record);
        let router = builder.freeze();

        run(&router, Method::GET, "/users/42/ban");
        run(&router, Method::GET, "/users/42/ban");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (Some("42".into()), Some("ban".into())));
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_weak_route_dispatch() {
        let mut builder = Router::builder();
        builder.weak_route("/api/", &[Method::GET]).attach(tag("api"));
        let router = builder.freeze();

        assert_eq!(run(&router, Method::GET, "/api/v1/users").1, "api");
        assert_eq!(run(&router, Method::GET, "/other").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_attach_named_partial_failure() {
        let mut registry = HandlerRegistry::new();
        registry.register("valid", tag("v"));
        registry.register("another", tag("x"));

        let mut builder = Router::builder();
        let mut handle = builder.strict_route("/", &[Method::GET]);
        let err = handle
            .attach_named(&registry, &["valid", "123", "another"])
            .err();
        assert_eq!(err, Some(RouteError::HandlerType("123".into())));
        assert_eq!(handle.handler_count(), 1);

        let router = builder.freeze();
        assert_eq!(run(&router, Method::GET, "/").1, "v");
    }

    #[test]
    fn test_from_config() {
        let mut registry = HandlerRegistry::new();
        registry.register("hello", tag("hello"));

        let routes = vec![RouteConfig {
            name: Some("greeting".into()),
            pattern: "/hello/:name".into(),
            methods: vec!["GET".into(), "HEAD".into()],
            strict: true,
            handlers: vec!["hello".into()],
        }];
        let router = Router::from_config(&routes, &registry).unwrap();

        let info: Vec<RouteInfo> = router.routes().collect();
        assert_eq!(info[0].name.as_deref(), Some("greeting"));
        assert_eq!(info[0].methods, vec!["GET", "HEAD"]);
        assert_eq!(run(&router, Method::HEAD, "/hello/bob").1, "hello");
    }

    #[test]
    fn test_from_config_rejects_bad_input() {
        let registry = HandlerRegistry::new();
        let mut route = RouteConfig {
            name: None,
            pattern: "/".into(),
            methods: vec!["GET".into()],
            strict: true,
            handlers: vec!["missing".into()],
        };
        assert_eq!(
            Router::from_config(std::slice::from_ref(&route), &registry).err(),
            Some(RouteError::HandlerType("missing".into()))
        );

        route.methods = vec!["BAD METHOD".into()];
        assert_eq!(
            Router::from_config(&[route], &registry).err(),
            Some(RouteError::InvalidMethod("BAD METHOD".into()))
        );
    }
}
