//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. A request that matches
//! nothing goes to the fallback handler, or gets a bare 404 when none is set.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; it is shared read-only by every connection.
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: Option<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), fallback: None }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and are available through
    /// [`Request::param`].
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with an existing route for
    /// the same method. Route tables are static, so this is a programming
    /// error caught at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// Register the handler for requests no route matches.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Runs the handler bound to the request's method and path.
    pub async fn route(&self, req: Request) -> Response {
        let found = Method::from_http(req.method())
            .and_then(|method| self.lookup(method, req.path()));

        match (found, &self.fallback) {
            (Some((handler, params)), _) => handler.call(req.with_params(params)).await,
            (None, Some(fallback)) => fallback.call(req).await,
            (None, None) => Response::status(StatusCode::NOT_FOUND),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn request(method: &str, uri: &str) -> Request {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        Request::new(parts, Bytes::new(), ([127, 0, 0, 1], 1).into())
    }

    async fn echo_param(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or("none").to_owned())
    }

    async fn fallback(req: Request) -> Response {
        Response::text(format!("fallback {} {}", req.method(), req.path()))
    }

    #[tokio::test]
    async fn captures_path_parameters() {
        let router = Router::new().on(Method::Get, "/users/{id}", echo_param);
        let res = router.route(request("GET", "/users/42")).await;
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn method_mismatch_uses_fallback() {
        let router = Router::new()
            .on(Method::Get, "/users/{id}", echo_param)
            .fallback(fallback);
        let res = router.route(request("PATCH", "/users/42")).await;
        assert_eq!(res.body(), b"fallback PATCH /users/42");
    }

    #[tokio::test]
    async fn extension_methods_use_fallback() {
        let router = Router::new().fallback(fallback);
        let res = router.route(request("PURGE", "/cache")).await;
        assert_eq!(res.body(), b"fallback PURGE /cache");
    }

    #[tokio::test]
    async fn no_fallback_means_not_found() {
        let router = Router::new();
        let res = router.route(request("GET", "/nowhere")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_routes_panic() {
        let _ = Router::new()
            .on(Method::Get, "/users/{id}", echo_param)
            .on(Method::Get, "/users/{name}", echo_param);
    }
}
