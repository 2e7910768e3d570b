//! Tests for route resolution through the trie.

use std::sync::Arc;

use oxide_web::{BoxHandler, Context, Engine, Method, PathParams, Router, RouterError};

mod common;
use common::*;

fn noop() -> BoxHandler {
    Arc::new(|_: &mut Context| {})
}

fn router(patterns: &[&str]) -> Router {
    let mut router = Router::new();
    for pattern in patterns {
        router.register(Method::Get, pattern, noop()).unwrap();
    }
    router
}

fn resolve(router: &Router, path: &str) -> (String, PathParams) {
    let route = router
        .resolve(Method::Get, path)
        .unwrap_or_else(|e| panic!("Expected a route for {path}: {e}"));
    (route.pattern, route.params)
}

#[test]
fn test_param_segment_binds_value() {
    let router = router(&["/p/:lang/doc"]);
    let (pattern, params) = resolve(&router, "/p/go/doc");
    assert_eq!(pattern, "/p/:lang/doc");
    assert_eq!(params.get("lang"), Some("go"));
    assert_eq!(params.len(), 1);
}

#[test]
fn test_wildcard_binds_joined_rest() {
    let router = router(&["/assets/*filepath"]);
    let (pattern, params) = resolve(&router, "/assets/css/site.css");
    assert_eq!(pattern, "/assets/*filepath");
    assert_eq!(params.get("filepath"), Some("css/site.css"));
}

#[test]
fn test_duplicate_and_trailing_slashes_are_ignored() {
    let router = router(&["/hello/:name"]);
    let (_, params) = resolve(&router, "//hello///ann/");
    assert_eq!(params.get("name"), Some("ann"));
}

#[test]
fn test_intermediate_node_is_not_a_route() {
    let router = router(&["/hello/doc"]);
    assert!(matches!(
        router.resolve(Method::Get, "/hello"),
        Err(RouterError::NotFound { .. })
    ));
}

#[test]
fn test_path_longer_than_any_pattern_is_not_found() {
    let router = router(&["/hello/:name"]);
    assert!(router.resolve(Method::Get, "/hello/ann/extra").is_err());
}

#[test]
fn test_param_registered_first_absorbs_literal_sibling() {
    let router = router(&["/a/:x", "/a/b"]);

    let (pattern, params) = resolve(&router, "/a/b");
    assert_eq!(pattern, "/a/b");
    assert!(params.is_empty());

    // The shared node now only knows the literal pattern.
    let (pattern, params) = resolve(&router, "/a/anything");
    assert_eq!(pattern, "/a/b");
    assert!(params.is_empty());
}

#[test]
fn test_literal_registered_first_keeps_both_branches() {
    let router = router(&["/a/b", "/a/:x"]);
    assert_eq!(resolve(&router, "/a/b").0, "/a/b");

    let (pattern, params) = resolve(&router, "/a/c");
    assert_eq!(pattern, "/a/:x");
    assert_eq!(params.get("x"), Some("c"));
}

#[test]
fn test_wildcard_registered_first_absorbs_literal() {
    let router = router(&["/files/*path", "/files/readme"]);
    let (pattern, params) = resolve(&router, "/files/readme");
    assert_eq!(pattern, "/files/readme");
    assert!(params.is_empty());
    assert_eq!(router.routes(Method::Get), vec!["/files/readme"]);
}

#[test]
fn test_reregistration_replaces_handler_without_touching_trie() {
    let trail = Trail::default();
    let app = build(
        Engine::new()
            .get("/v/:id", marker(&trail, "first"))
            .get("/v/:id", marker(&trail, "second")),
    );

    assert_eq!(app.routes(Method::Get), vec!["/v/:id"]);
    assert_eq!(body(&get(&app, "/v/1")), "second");
    assert_eq!(trail.entries(), vec!["second"]);
}

#[test]
fn test_invalid_patterns_fail_the_build() {
    let result = Engine::new().get("/a/*rest/b", |_| {}).build();
    assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));

    let result = Engine::new().get("/users/:", |_| {}).build();
    assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
}

#[test]
fn test_methods_are_routed_independently() {
    let trail = Trail::default();
    let app = build(
        Engine::new()
            .get("/login", marker(&trail, "get"))
            .post("/login", marker(&trail, "post")),
    );

    assert_eq!(body(&get(&app, "/login")), "get");
    let res = app.dispatch(oxide_web::Request::post("/login"));
    assert_eq!(body(&res), "post");
    let res = app.dispatch(oxide_web::Request::new(Method::Delete, "/login"));
    assert_eq!(res.status, 404);
}
