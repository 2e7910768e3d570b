//! Built-in middleware.
//!
//! Middleware are ordinary chain entries implementing [`Handler`]. Work
//! done before [`Context::next`] happens on the way in, work done after it
//! on the way out.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{error, info};

use crate::context::Context;
use crate::request::Method;
use crate::router::Handler;

/// Middleware that logs every finished request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Handler for Logger {
    fn call(&self, ctx: &mut Context) {
        let started = Instant::now();
        ctx.next();
        info!(
            method = %ctx.method(),
            path = ctx.path(),
            status = ctx.status(),
            elapsed = ?started.elapsed(),
            "request finished"
        );
    }
}

/// Middleware that turns a panic in any later handler into a 500 response.
///
/// Install it before every handler it should protect; a panic raised
/// outside its `next` call is not caught.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

impl Handler for Recovery {
    fn call(&self, ctx: &mut Context) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| ctx.next()));
        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            let backtrace = Backtrace::force_capture();
            error!(
                method = %ctx.method(),
                path = ctx.path(),
                %message,
                %backtrace,
                "handler panicked"
            );
            ctx.fail(500, "Internal Server Error");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Middleware that requires authentication.
#[derive(Debug, Clone, Default)]
pub struct AuthMiddleware {
    /// Path prefixes that skip authentication.
    pub exclude: Vec<String>,
}

impl AuthMiddleware {
    /// Creates new auth middleware.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds paths to exclude from authentication.
    #[must_use]
    pub fn exclude(mut self, paths: &[&str]) -> Self {
        self.exclude = paths.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Checks if a path should be excluded.
    fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|p| path.starts_with(p))
    }

    fn is_authenticated(ctx: &Context) -> bool {
        ctx.header("Authorization").is_some()
            || ctx
                .header("Cookie")
                .is_some_and(|c| c.contains("session="))
    }
}

impl Handler for AuthMiddleware {
    fn call(&self, ctx: &mut Context) {
        if self.is_excluded(ctx.path()) || Self::is_authenticated(ctx) {
            ctx.next();
        } else {
            ctx.fail(401, "unauthorized");
        }
    }
}

/// Middleware that adds CORS headers.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    /// Allowed origins.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
}

impl CorsMiddleware {
    /// Creates CORS middleware that allows all origins.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: [
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Options,
            ]
            .iter()
            .map(|m| m.as_str().to_string())
            .collect(),
            allowed_headers: vec!["*".to_string()],
        }
    }

    /// Creates CORS middleware with specific origins.
    pub fn new(origins: &[&str]) -> Self {
        Self {
            allowed_origins: origins.iter().map(|s| (*s).to_string()).collect(),
            allowed_methods: [Method::Get, Method::Post, Method::Put, Method::Delete]
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

impl Handler for CorsMiddleware {
    fn call(&self, ctx: &mut Context) {
        let origins = self.allowed_origins.join(", ");

        // Preflight requests never reach a route.
        if ctx.method() == Method::Options {
            ctx.set_header("Access-Control-Allow-Origin", origins);
            ctx.set_header(
                "Access-Control-Allow-Methods",
                self.allowed_methods.join(", "),
            );
            ctx.set_header(
                "Access-Control-Allow-Headers",
                self.allowed_headers.join(", "),
            );
            ctx.set_header("Access-Control-Max-Age", "86400");
            ctx.data(204, Vec::new());
            ctx.abort();
            return;
        }

        ctx.next();
        ctx.set_header("Access-Control-Allow-Origin", origins);
    }
}
