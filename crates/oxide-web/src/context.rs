//! Per-request context and the handler chain executor.
//!
//! A [`Context`] carries the request, the response being built, the bound
//! path parameters, and the chain of handlers for this request: the group
//! middleware followed by the resolved route handler. The chain is driven by
//! a cursor that starts before the first entry.
//!
//! Calling [`Context::next`] from inside a handler runs the rest of the chain
//! before returning, so code placed before the call runs outer-to-inner and
//! code after it runs inner-to-outer:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use oxide_web::{BoxHandler, Context, Request};
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let outer = Arc::clone(&log);
//! let inner = Arc::clone(&log);
//! let chain: Vec<BoxHandler> = vec![
//!     Arc::new(move |ctx: &mut Context| {
//!         outer.lock().unwrap().push("before");
//!         ctx.next();
//!         outer.lock().unwrap().push("after");
//!     }),
//!     Arc::new(move |ctx: &mut Context| {
//!         inner.lock().unwrap().push("handler");
//!         ctx.string(200, "ok");
//!     }),
//! ];
//!
//! let mut ctx = Context::new(Request::get("/")).with_handlers(chain);
//! ctx.next();
//! assert_eq!(*log.lock().unwrap(), vec!["before", "handler", "after"]);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{trace, warn};

use crate::error::TemplateError;
use crate::request::{Method, PathParams, Request};
use crate::response::Response;
use crate::router::BoxHandler;
use crate::template::TemplateRenderer;

/// State of a single request while its handler chain runs.
pub struct Context {
    request: Request,
    response: Response,
    params: PathParams,
    handlers: Vec<BoxHandler>,
    /// Position in `handlers`; -1 before the chain starts.
    index: isize,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl Context {
    /// Creates a context for `request` with an empty chain.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Response::default(),
            params: PathParams::new(),
            handlers: Vec::new(),
            index: -1,
            renderer: None,
        }
    }

    /// Replaces the handler chain.
    #[must_use]
    pub fn with_handlers(mut self, handlers: Vec<BoxHandler>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Installs the renderer used by [`Context::html`].
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub(crate) fn push_handler(&mut self, handler: BoxHandler) {
        self.handlers.push(handler);
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    /// Runs the remaining handlers of the chain.
    ///
    /// Each handler is called with this same context and may call `next`
    /// itself. When a handler returns, the cursor moves on to the following
    /// entry, until the cursor passes the end of the chain.
    pub fn next(&mut self) {
        self.index += 1;
        while let Some(handler) = self.current_handler() {
            trace!(
                index = self.index,
                handlers = self.handlers.len(),
                "dispatching chain entry"
            );
            handler.call(self);
            self.index += 1;
        }
    }

    fn current_handler(&self) -> Option<BoxHandler> {
        usize::try_from(self.index)
            .ok()
            .and_then(|index| self.handlers.get(index))
            .cloned()
    }

    /// Stops forward dispatch without writing a response.
    ///
    /// Handlers that already called `next` still run the code after it.
    pub fn abort(&mut self) {
        self.index = isize::try_from(self.handlers.len()).unwrap_or(isize::MAX);
    }

    /// Stops forward dispatch and answers with `{"message": message}`.
    pub fn fail(&mut self, status: u16, message: &str) {
        self.abort();
        self.json(status, &serde_json::json!({ "message": message }));
    }

    /// Whether the cursor has moved past the last handler.
    pub fn is_finished(&self) -> bool {
        usize::try_from(self.index).is_ok_and(|index| index >= self.handlers.len())
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.request.method
    }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        &self.request.path
    }

    /// The underlying request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// A path parameter bound by the matched route.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// All bound path parameters.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Sets or overrides a path parameter, e.g. from a rewriting middleware.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key, value);
    }

    /// A query string value.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.get_query(key)
    }

    /// A form value from an urlencoded body, falling back to the query
    /// string.
    pub fn post_form(&self, key: &str) -> Option<String> {
        self.request
            .form()
            .remove(key)
            .or_else(|| self.query(key).map(str::to_string))
    }

    /// A request header, looked up case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.request.get_header(key)
    }

    /// The status code of the response built so far.
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Sets the response status code.
    pub fn set_status(&mut self, status: u16) {
        self.response.status = status;
    }

    /// Sets a response header.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.response.set_header(key, value);
    }

    /// Writes a plain text body.
    pub fn string(&mut self, status: u16, body: impl Into<String>) {
        self.write(Response::text(body).status(status));
    }

    /// Writes `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: u16, value: &T) {
        match Response::json(value) {
            Ok(response) => self.write(response.status(status)),
            Err(err) => {
                warn!(error = %err, path = self.path(), "failed to serialize JSON response");
                self.write(Response::internal_server_error());
            }
        }
    }

    /// Writes a raw body without a content type.
    pub fn data(&mut self, status: u16, body: impl Into<Vec<u8>>) {
        self.write(Response::new(status).body(body));
    }

    /// Renders template `name` through the installed renderer.
    ///
    /// A missing renderer or a rendering error turns into `fail(500, ..)`.
    pub fn html<T: Serialize + ?Sized>(&mut self, status: u16, name: &str, data: &T) {
        let Some(renderer) = self.renderer.clone() else {
            self.fail(500, "no template renderer installed");
            return;
        };

        let rendered = serde_json::to_value(data)
            .map_err(TemplateError::from)
            .and_then(|value| renderer.render(name, &value));
        match rendered {
            Ok(body) => self.write(Response::html(body).status(status)),
            Err(err) => self.fail(500, &err.to_string()),
        }
    }

    /// Status and body are replaced, headers are merged.
    fn write(&mut self, response: Response) {
        self.response.status = response.status;
        for (key, value) in response.headers {
            self.response.set_header(key, value);
        }
        self.response.body = response.body;
    }

    /// The response built so far.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Finishes the request and returns its response.
    pub fn into_response(self) -> Response {
        self.response
    }
}
