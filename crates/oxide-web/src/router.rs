//! Route registration and lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::error::{Result, RouterError};
use crate::path::{self, PathSegment};
use crate::request::{Method, PathParams};
use crate::trie::Node;

/// A step of the handler chain: a middleware or a route handler.
pub trait Handler: Send + Sync {
    /// Runs this step against the request context.
    fn call(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        self(ctx);
    }
}

/// A shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// The outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The pattern the route was registered with.
    pub pattern: String,
    /// Parameters bound from the request path.
    pub params: PathParams,
}

/// One prefix tree per method plus the handlers of every registered route.
///
/// Registration takes `&mut self` and lookup `&self`, so once the router is
/// shared between requests it can no longer change.
#[derive(Default)]
pub struct Router {
    roots: HashMap<Method, Node>,
    handlers: HashMap<String, BoxHandler>,
}

fn handler_key(method: Method, pattern: &str) -> String {
    format!("{method}-{pattern}")
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// Registering the same method and pattern again replaces the handler.
    pub fn register(&mut self, method: Method, pattern: &str, handler: BoxHandler) -> Result<()> {
        path::validate_pattern(pattern)?;

        let parts = path::tokenize(pattern);
        debug!(%method, pattern, ?parts, "registering route");

        self.roots
            .entry(method)
            .or_default()
            .insert(pattern, &parts, 0);
        self.handlers.insert(handler_key(method, pattern), handler);
        Ok(())
    }

    /// Resolves a request path to a registered pattern and its parameters.
    pub fn resolve(&self, method: Method, path: &str) -> Result<RouteMatch> {
        let not_found = || RouterError::NotFound {
            method: method.to_string(),
            path: path.to_string(),
        };

        let root = self.roots.get(&method).ok_or_else(not_found)?;
        let search_parts = path::tokenize(path);
        let node = root.search(&search_parts, 0).ok_or_else(not_found)?;

        let params = bind_params(node.pattern(), &search_parts);
        debug!(%method, path, pattern = node.pattern(), ?params, "resolved route");

        Ok(RouteMatch {
            pattern: node.pattern().to_string(),
            params,
        })
    }

    /// The handler registered for exactly `method` and `pattern`.
    pub fn handler(&self, method: Method, pattern: &str) -> Option<&BoxHandler> {
        self.handlers.get(&handler_key(method, pattern))
    }

    /// Every pattern registered for `method`, in trie order.
    pub fn routes(&self, method: Method) -> Vec<String> {
        let mut patterns = Vec::new();
        if let Some(root) = self.roots.get(&method) {
            root.collect_patterns(&mut patterns);
        }
        patterns.into_iter().map(str::to_string).collect()
    }

    /// Appends the handler for the context's route to its chain, or a 404
    /// responder if nothing matches, and runs the chain.
    pub fn handle(&self, ctx: &mut Context) {
        let handler = match self.resolve(ctx.method(), ctx.path()) {
            Ok(route) => {
                let handler = self.handler(ctx.method(), &route.pattern).cloned();
                ctx.set_params(route.params);
                handler
            }
            Err(err) => {
                debug!(error = %err, "falling back to 404 handler");
                None
            }
        };

        ctx.push_handler(handler.unwrap_or_else(|| Arc::new(not_found)));
        ctx.next();
    }
}

/// Binds the parameters of `pattern` against the tokens of a request path.
fn bind_params(pattern: &str, search_parts: &[&str]) -> PathParams {
    let mut params = PathParams::new();
    for (index, part) in path::tokenize(pattern).into_iter().enumerate() {
        match PathSegment::parse(part) {
            PathSegment::Param(name) => {
                if let Some(value) = search_parts.get(index) {
                    params.insert(name, *value);
                }
            }
            PathSegment::Wildcard(name) => {
                if !name.is_empty() {
                    let rest = search_parts.get(index..).unwrap_or_default();
                    params.insert(name, rest.join("/"));
                }
                break;
            }
            PathSegment::Literal(_) => {}
        }
    }
    params
}

fn not_found(ctx: &mut Context) {
    let body = format!("404 NOT FOUND : {}\n", ctx.path());
    ctx.string(404, body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    fn noop() -> BoxHandler {
        Arc::new(|_: &mut Context| {})
    }

    fn text(body: &'static str) -> BoxHandler {
        Arc::new(move |ctx: &mut Context| ctx.string(200, body))
    }

    fn router(routes: &[(Method, &str)]) -> Router {
        let mut router = Router::new();
        for (method, pattern) in routes {
            router.register(*method, pattern, noop()).unwrap();
        }
        router
    }

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs.iter().copied().collect()
    }

    fn run(router: &Router, request: Request) -> Context {
        let mut ctx = Context::new(request);
        router.handle(&mut ctx);
        ctx
    }

    #[test]
    fn test_resolve_param_route() {
        let router = router(&[(Method::Get, "/p/:lang/doc")]);
        let route = router.resolve(Method::Get, "/p/go/doc").unwrap();
        assert_eq!(route.pattern, "/p/:lang/doc");
        assert_eq!(route.params, params(&[("lang", "go")]));
    }

    #[test]
    fn test_resolve_wildcard_route() {
        let router = router(&[(Method::Get, "/assets/*filepath")]);
        let route = router.resolve(Method::Get, "/assets/css/site.css").unwrap();
        assert_eq!(route.pattern, "/assets/*filepath");
        assert_eq!(route.params, params(&[("filepath", "css/site.css")]));
    }

    #[test]
    fn test_bare_wildcard_binds_nothing() {
        let router = router(&[(Method::Get, "/files/*")]);
        let route = router.resolve(Method::Get, "/files/a/b").unwrap();
        assert_eq!(route.pattern, "/files/*");
        assert!(route.params.is_empty());
    }

    #[test]
    fn test_resolve_mixed_params() {
        let router = router(&[(Method::Get, "/u/:user/files/*path")]);
        let route = router.resolve(Method::Get, "/u/ann/files/x/y.txt").unwrap();
        assert_eq!(
            route.params,
            params(&[("user", "ann"), ("path", "x/y.txt")])
        );
    }

    #[test]
    fn test_unregistered_intermediate_is_not_found() {
        let router = router(&[(Method::Get, "/hello/doc")]);
        let err = router.resolve(Method::Get, "/hello").unwrap_err();
        assert!(matches!(
            err,
            RouterError::NotFound { ref method, ref path } if method == "GET" && path == "/hello"
        ));
    }

    #[test]
    fn test_unknown_method_is_not_found() {
        let router = router(&[(Method::Get, "/hello")]);
        assert!(matches!(
            router.resolve(Method::Post, "/hello"),
            Err(RouterError::NotFound { .. })
        ));
    }

    #[test]
    fn test_methods_have_separate_trees() {
        let router = router(&[(Method::Get, "/login"), (Method::Post, "/login/:step")]);
        assert!(router.resolve(Method::Get, "/login").is_ok());
        assert!(router.resolve(Method::Get, "/login/one").is_err());
        assert!(router.resolve(Method::Post, "/login").is_err());
        assert!(router.resolve(Method::Post, "/login/one").is_ok());
    }

    #[test]
    fn test_param_node_absorbs_later_literal() {
        let router = router(&[(Method::Get, "/a/:x"), (Method::Get, "/a/b")]);

        let route = router.resolve(Method::Get, "/a/b").unwrap();
        assert_eq!(route.pattern, "/a/b");
        assert!(route.params.is_empty());

        let route = router.resolve(Method::Get, "/a/zzz").unwrap();
        assert_eq!(route.pattern, "/a/b");
        assert!(route.params.is_empty());

        assert_eq!(router.routes(Method::Get), vec!["/a/b"]);
        assert!(router.handler(Method::Get, "/a/:x").is_some());
    }

    #[test]
    fn test_later_param_node_keeps_earlier_literal() {
        let router = router(&[(Method::Get, "/a/b"), (Method::Get, "/a/:x")]);
        assert_eq!(router.resolve(Method::Get, "/a/b").unwrap().pattern, "/a/b");

        let route = router.resolve(Method::Get, "/a/c").unwrap();
        assert_eq!(route.pattern, "/a/:x");
        assert_eq!(route.params, params(&[("x", "c")]));
    }

    #[test]
    fn test_shared_param_node_binds_by_matched_pattern() {
        let router = router(&[(Method::Get, "/p/:lang"), (Method::Get, "/p/:id/x")]);
        let route = router.resolve(Method::Get, "/p/go/x").unwrap();
        assert_eq!(route.pattern, "/p/:id/x");
        assert_eq!(route.params, params(&[("id", "go")]));
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        let mut router = Router::new();
        router.register(Method::Get, "/v", text("one")).unwrap();
        router.register(Method::Get, "/v", text("two")).unwrap();

        assert_eq!(router.routes(Method::Get), vec!["/v"]);
        let ctx = run(&router, Request::get("/v"));
        assert_eq!(ctx.response().body_string(), Some("two".to_string()));
    }

    #[test]
    fn test_register_rejects_invalid_pattern() {
        let mut router = Router::new();
        let err = router
            .register(Method::Get, "/static/*path/more", noop())
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidPattern { .. }));
        assert!(router.routes(Method::Get).is_empty());
        assert!(router.handler(Method::Get, "/static/*path/more").is_none());
    }

    #[test]
    fn test_handle_binds_params_and_runs_handler() {
        let mut router = Router::new();
        router
            .register(
                Method::Get,
                "/hello/:name",
                Arc::new(|ctx: &mut Context| {
                    let body = format!("hello {}", ctx.param("name").unwrap_or_default());
                    ctx.string(200, body);
                }),
            )
            .unwrap();

        let ctx = run(&router, Request::get("/hello/ann"));
        assert_eq!(ctx.status(), 200);
        assert_eq!(ctx.response().body_string(), Some("hello ann".to_string()));
    }

    #[test]
    fn test_handle_falls_back_to_404() {
        let router = router(&[(Method::Get, "/hello")]);
        let ctx = run(&router, Request::get("/nope"));
        assert_eq!(ctx.status(), 404);
        assert_eq!(
            ctx.response().body_string(),
            Some("404 NOT FOUND : /nope\n".to_string())
        );
        assert!(router.handler(Method::Get, "/nope").is_none());
    }
}
