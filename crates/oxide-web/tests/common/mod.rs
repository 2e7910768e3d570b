#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use oxide_web::{App, Context, Engine, Request, Response};

/// Shared list of markers written by handlers, in execution order.
#[derive(Clone, Default)]
pub struct Trail(Arc<Mutex<Vec<String>>>);

impl Trail {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Middleware writing `{name}-before` and `{name}-after` around `next`.
pub fn around(trail: &Trail, name: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
    let trail = trail.clone();
    move |ctx| {
        trail.push(format!("{name}-before"));
        ctx.next();
        trail.push(format!("{name}-after"));
    }
}

/// Route handler writing `marker` and answering with it as text.
pub fn marker(trail: &Trail, marker: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
    let trail = trail.clone();
    move |ctx| {
        trail.push(marker);
        ctx.string(200, marker);
    }
}

pub fn build(engine: Engine) -> App {
    engine
        .build()
        .unwrap_or_else(|e| panic!("Failed to build app: {e}"))
}

pub fn get(app: &App, path: &str) -> Response {
    app.dispatch(Request::get(path))
}

pub fn body(res: &Response) -> String {
    res.body_string()
        .unwrap_or_else(|| panic!("Response body is not UTF-8: {res:?}"))
}
