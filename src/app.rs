//! The request pipeline.
//!
//! ```text
//! request ─▶ CORS headers ─▶ OPTIONS? ──yes──▶ 204
//!                               │ no
//!                               ▼
//!                           recorder ─▶ router ─▶ dispatcher | health | echo | fallback
//! ```

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Body;
use tracing::debug;

use crate::artifact::{ArtifactStore, Dispatcher};
use crate::config::Config;
use crate::middleware::cors::OriginPolicy;
use crate::middleware::recorder;
use crate::response::{HttpWriter, ResponseWriter};
use crate::router::Router;
use crate::routes::{self, ROUTES};

/// Everything needed to answer a request. Built once, shared read-only.
pub struct App {
    policy: OriginPolicy,
    router: Router,
}

impl App {
    /// The full mock API surface described by `config`.
    pub fn new(config: &Config) -> Self {
        let dispatcher = Dispatcher::new(ArtifactStore::new(&config.artifact_dir));
        Self::with_router(OriginPolicy::from_config(config), routes::router(ROUTES, &dispatcher))
    }

    /// A pipeline around a custom router.
    pub fn with_router(policy: OriginPolicy, router: Router) -> Self {
        Self { policy, router }
    }

    /// Runs one request through CORS, the recorder and the router.
    ///
    /// Infallible: every failure below this point is already an HTTP
    /// response or a log line.
    pub async fn handle<B>(
        &self,
        req: http::Request<B>,
        remote_addr: SocketAddr,
    ) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: fmt::Display,
    {
        let mut writer = HttpWriter::new();
        let decision = self.policy.apply(req.headers(), writer.headers_mut());

        if req.method() == http::Method::OPTIONS {
            debug!(path = req.uri().path(), allowed = decision.is_allowed(), "preflight answered");
            writer.write_status(StatusCode::NO_CONTENT);
            return writer.into_response();
        }

        recorder::record(req, remote_addr, &mut writer, |req| self.router.route(req)).await;
        writer.into_response()
    }
}
