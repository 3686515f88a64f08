//! The mock API surface.
//!
//! | Method | Path | Answer |
//! |---|---|---|
//! | GET | `/users` | `users.json` |
//! | POST | `/users` | `user.json`, 201 |
//! | GET, PUT | `/users/{id}` | `user.json` |
//! | DELETE | `/users/{id}` | 204 |
//! | GET | `/products` | `products.json` |
//! | GET | `/products/{id}` | `product.json` |
//! | POST | `/orders` | `order.json`, 201 |
//! | GET | `/health` | liveness document |
//! | any | `/echo` | request body |
//! | anything else | | fallback acknowledgment |
//!
//! Path parameters are captured but never change the answer.

use crate::artifact::Dispatcher;
use crate::echo::echo;
use crate::fallback::acknowledge;
use crate::health::liveness;
use crate::method::Method;
use crate::router::Router;

/// What a binding answers with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Serve `<name>.json` from the artifact store.
    Artifact(&'static str),
    /// 204 with the standard headers and no body.
    NoContent,
    Health,
    Echo,
}

/// One entry of the route table. `method: None` binds every method.
#[derive(Clone, Copy, Debug)]
pub struct RouteBinding {
    pub method: Option<Method>,
    pub path: &'static str,
    pub target: Target,
}

const fn bind(method: Method, path: &'static str, target: Target) -> RouteBinding {
    RouteBinding { method: Some(method), path, target }
}

pub const ROUTES: &[RouteBinding] = &[
    bind(Method::Get,    "/users",          Target::Artifact("users")),
    bind(Method::Post,   "/users",          Target::Artifact("user")),
    bind(Method::Get,    "/users/{id}",     Target::Artifact("user")),
    bind(Method::Put,    "/users/{id}",     Target::Artifact("user")),
    bind(Method::Delete, "/users/{id}",     Target::NoContent),
    bind(Method::Get,    "/products",       Target::Artifact("products")),
    bind(Method::Get,    "/products/{id}",  Target::Artifact("product")),
    bind(Method::Post,   "/orders",         Target::Artifact("order")),
    bind(Method::Get,    "/health",         Target::Health),
    RouteBinding { method: None, path: "/echo", target: Target::Echo },
];

/// Builds the router for `bindings`, with the acknowledgment fallback.
pub fn router(bindings: &[RouteBinding], dispatcher: &Dispatcher) -> Router {
    let mut router = Router::new().fallback(acknowledge);
    for binding in bindings {
        let methods = match binding.method {
            Some(method) => vec![method],
            None => Method::ALL.to_vec(),
        };
        for method in methods {
            router = bind_target(router, method, binding, dispatcher);
        }
    }
    router
}

fn bind_target(router: Router, method: Method, binding: &RouteBinding, dispatcher: &Dispatcher) -> Router {
    let path = binding.path;
    match binding.target {
        Target::Artifact(name) => {
            let dispatcher = dispatcher.clone();
            router.on(method, path, move |req| {
                let dispatcher = dispatcher.clone();
                async move { dispatcher.serve(req, name).await }
            })
        }
        Target::NoContent => {
            let dispatcher = dispatcher.clone();
            router.on(method, path, move |req| {
                let res = dispatcher.delete(&req);
                async move { res }
            })
        }
        Target::Health => router.on(method, path, liveness),
        Target::Echo => router.on(method, path, echo),
    }
}
