//! Application builder, route groups and request dispatch.

use std::sync::Arc;

use tracing::{debug, info};

use crate::context::Context;
use crate::error::Result;
use crate::request::{Method, Request};
use crate::response::Response;
use crate::router::{BoxHandler, Handler, Router};
use crate::template::TemplateRenderer;

enum Entry {
    Route {
        method: Method,
        path: String,
        handler: BoxHandler,
    },
    Group(RouteGroup),
}

/// Middleware that applies to every request whose path starts with `prefix`.
struct GroupMiddleware {
    prefix: String,
    middleware: Vec<BoxHandler>,
}

/// A group of routes with a common prefix and shared middleware.
///
/// Routes and nested groups keep the order they were added in, and are
/// registered in that order when the [`Engine`] is built.
pub struct RouteGroup {
    /// URL prefix for all routes in this group.
    prefix: String,
    /// Routes and nested groups, relative to `prefix`.
    entries: Vec<Entry>,
    /// Middleware for this group.
    middleware: Vec<BoxHandler>,
}

impl RouteGroup {
    /// Creates a new route group with the given prefix.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            entries: Vec::new(),
            middleware: Vec::new(),
        }
    }

    /// The prefix relative to the parent group.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Put, path, handler)
    }

    /// Adds a PATCH route.
    #[must_use]
    pub fn patch<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Patch, path, handler)
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Delete, path, handler)
    }

    /// Adds a route with any method.
    #[must_use]
    pub fn route<F>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.entries.push(Entry::Route {
            method,
            path: path.to_string(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Adds middleware to this group.
    #[must_use]
    pub fn middleware(mut self, mw: impl Handler + 'static) -> Self {
        self.middleware.push(Arc::new(mw));
        self
    }

    /// Nests `group` below this one; its prefix is appended to ours.
    #[must_use]
    pub fn group(mut self, group: Self) -> Self {
        self.entries.push(Entry::Group(group));
        self
    }

    fn register_into(
        self,
        parent_prefix: &str,
        router: &mut Router,
        groups: &mut Vec<GroupMiddleware>,
    ) -> Result<()> {
        let prefix = format!("{parent_prefix}{}", self.prefix);
        groups.push(GroupMiddleware {
            prefix: prefix.clone(),
            middleware: self.middleware,
        });

        for entry in self.entries {
            match entry {
                Entry::Route {
                    method,
                    path,
                    handler,
                } => router.register(method, &format!("{prefix}{path}"), handler)?,
                Entry::Group(group) => group.register_into(&prefix, router, groups)?,
            }
        }
        Ok(())
    }
}

/// Collects routes, groups and middleware, then builds an [`App`].
///
/// ```
/// use oxide_web::{Engine, Logger, Recovery, Request, RouteGroup};
///
/// let app = Engine::new()
///     .middleware(Logger)
///     .middleware(Recovery)
///     .get("/hello/:name", |ctx| {
///         let body = format!("hello {}", ctx.param("name").unwrap_or_default());
///         ctx.string(200, body);
///     })
///     .group(RouteGroup::new("/v1").get("/ping", |ctx| ctx.string(200, "pong")))
///     .build()
///     .unwrap();
///
/// let res = app.dispatch(Request::get("/hello/ann"));
/// assert_eq!(res.body_string(), Some("hello ann".to_string()));
/// assert_eq!(app.dispatch(Request::get("/v1/ping")).status, 200);
/// assert_eq!(app.dispatch(Request::get("/v2/ping")).status, 404);
/// ```
pub struct Engine {
    root: RouteGroup,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with no routes.
    pub fn new() -> Self {
        Self {
            root: RouteGroup::new(""),
            renderer: None,
        }
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Put, path, handler)
    }

    /// Adds a PATCH route.
    #[must_use]
    pub fn patch<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Patch, path, handler)
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::Delete, path, handler)
    }

    /// Adds a route with any method.
    #[must_use]
    pub fn route<F>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root = self.root.route(method, path, handler);
        self
    }

    /// Adds middleware that runs for every request.
    #[must_use]
    pub fn middleware(mut self, mw: impl Handler + 'static) -> Self {
        self.root = self.root.middleware(mw);
        self
    }

    /// Adds a route group.
    #[must_use]
    pub fn group(mut self, group: RouteGroup) -> Self {
        self.root = self.root.group(group);
        self
    }

    /// Installs the renderer used by [`Context::html`].
    #[must_use]
    pub fn renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Registers every route and returns the immutable application.
    ///
    /// Fails on the first invalid route pattern.
    pub fn build(self) -> Result<App> {
        let mut router = Router::new();
        let mut groups = Vec::new();
        self.root.register_into("", &mut router, &mut groups)?;

        info!(groups = groups.len(), "engine built");
        Ok(App {
            router,
            groups,
            renderer: self.renderer,
        })
    }
}

/// A built application. Cheap to share between request tasks.
pub struct App {
    router: Router,
    groups: Vec<GroupMiddleware>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl App {
    /// Runs `request` through its group middleware and route handler.
    ///
    /// Middleware of every group whose prefix starts the request path is
    /// included, outermost group first. A panicking handler is only turned
    /// into a response if [`Recovery`](crate::Recovery) is in the chain.
    pub fn dispatch(&self, request: Request) -> Response {
        let middleware: Vec<BoxHandler> = self
            .groups
            .iter()
            .filter(|group| request.path.starts_with(&group.prefix))
            .flat_map(|group| group.middleware.iter().cloned())
            .collect();
        debug!(
            method = %request.method,
            path = %request.path,
            middleware = middleware.len(),
            "dispatching request"
        );

        let mut ctx = Context::new(request).with_handlers(middleware);
        if let Some(renderer) = &self.renderer {
            ctx = ctx.with_renderer(Arc::clone(renderer));
        }
        self.router.handle(&mut ctx);
        ctx.into_response()
    }

    /// The router holding every registered route.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Every pattern registered for `method`.
    pub fn routes(&self, method: Method) -> Vec<String> {
        self.router.routes(method)
    }
}
