//! # oxide-web
//!
//! Trie-based dynamic routing with an onion-style middleware chain.
//!
//! This crate provides:
//! - One prefix tree per HTTP method, with `:name` and `*name` segments
//! - Route groups with prefixes and per-group middleware
//! - A reentrant handler chain: code before [`Context::next`] runs on the
//!   way in, code after it on the way out
//! - Short-circuiting with [`Context::fail`] and panic recovery
//!
//! ## Quick Start
//!
//! ```
//! use oxide_web::{Engine, Logger, Recovery, Request};
//!
//! let app = Engine::new()
//!     .middleware(Logger)
//!     .middleware(Recovery)
//!     .get("/p/:lang/doc", |ctx| {
//!         let lang = ctx.param("lang").unwrap_or_default().to_string();
//!         ctx.json(200, &serde_json::json!({ "lang": lang }));
//!     })
//!     .build()
//!     .unwrap();
//!
//! let res = app.dispatch(Request::get("/p/go/doc"));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body_json().unwrap()["lang"], "go");
//! ```
//!
//! ## Patterns
//!
//! - `/users` matches exactly
//! - `/users/:id` matches one segment and binds `id`
//! - `/assets/*filepath` matches one or more trailing segments and binds
//!   them joined by `/`
//!
//! Lookups follow insertion order. A parameter or wildcard node reuses a
//! later literal registered at the same depth, so register literal routes
//! before their parameterized siblings:
//!
//! ```
//! use oxide_web::{Method, Router};
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//! router.register(Method::Get, "/a/:x", Arc::new(|_: &mut oxide_web::Context| {})).unwrap();
//! router.register(Method::Get, "/a/b", Arc::new(|_: &mut oxide_web::Context| {})).unwrap();
//! assert_eq!(router.resolve(Method::Get, "/a/whatever").unwrap().pattern, "/a/b");
//! ```
//!
//! ## Middleware
//!
//! Middleware and route handlers share the [`Handler`] trait. Install
//! [`Recovery`] first so that it wraps everything after it.
//!
//! ```
//! use oxide_web::{AuthMiddleware, Engine, Recovery, Request, RouteGroup};
//!
//! let app = Engine::new()
//!     .middleware(Recovery)
//!     .group(
//!         RouteGroup::new("/admin")
//!             .middleware(AuthMiddleware::new())
//!             .get("/", |ctx| ctx.string(200, "welcome")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(app.dispatch(Request::get("/admin/")).status, 401);
//! ```

mod context;
mod engine;
mod error;
mod middleware;
pub mod path;
mod request;
mod response;
mod router;
mod template;
pub mod trie;

pub use context::Context;
pub use engine::{App, Engine, RouteGroup};
pub use error::{Result, RouterError, TemplateError};
pub use middleware::{AuthMiddleware, CorsMiddleware, Logger, Recovery};
pub use path::PathSegment;
pub use request::{Method, PathParams, Request};
pub use response::{Response, APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN};
pub use router::{BoxHandler, Handler, RouteMatch, Router};
pub use template::TemplateRenderer;
