//! # decoy
//!
//! A mock HTTP API for client developers. It accepts anything, logs every
//! request and response in full, and answers from a directory of static
//! JSON files chosen by method and path. What the client sends never changes
//! what it gets back.
//!
//! ## The pipeline
//!
//! 1. **CORS**: [`middleware::cors::OriginPolicy`] decides the
//!    `Access-Control-*` headers. `OPTIONS` preflights stop here with 204.
//! 2. **Recorder**: [`middleware::recorder::record`] reads the body, logs a
//!    [`RequestObservation`](middleware::recorder::RequestObservation), and
//!    captures the outgoing status and body through a [`ResponseWriter`]
//!    decorator.
//! 3. **Router**: a matched binding serves an artifact, the health document,
//!    or an echo; anything else gets the fallback acknowledgment.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use decoy::{App, Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), decoy::Error> {
//!     let config = Config::from_env()?;
//!     Server::bind(config.addr()).serve(App::new(&config)).await
//! }
//! ```
//!
//! ```text
//! $ curl -i -X POST localhost:8080/users -d 'anything at all'
//! HTTP/1.1 201 Created
//! content-type: application/json
//! x-served-by: decoy
//! ...
//! ```

mod app;
mod config;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod artifact;
pub mod echo;
pub mod fallback;
pub mod health;
pub mod middleware;
pub mod routes;

pub use app::App;
pub use config::{Config, parse_origin_list};
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{HttpWriter, IntoResponse, Response, ResponseBuilder, ResponseWriter};
pub use router::Router;
pub use server::Server;

/// Value of the `X-Served-By` header and the health document's `server`.
pub const SERVER_NAME: &str = "decoy";
