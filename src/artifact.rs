//! Static response artifacts and the dispatcher that serves them.
//!
//! An artifact is a JSON file `<dir>/<name>.json`. The dispatcher never looks
//! at it: the bytes on disk are the bytes on the wire. Request bodies are
//! parsed only to log them, so a client sending garbage still gets the
//! canned answer.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::request::Request;
use crate::response::{Response, ResponseBuilder};
use crate::SERVER_NAME;

pub const SERVED_BY: &str = "x-served-by";
pub const TIMESTAMP: &str = "x-timestamp";

/// Current UTC time, RFC 3339 with second precision (`2024-05-01T12:00:00Z`).
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Builder pre-loaded with the identity and timestamp headers every
/// dispatched response carries.
pub(crate) fn stamped() -> ResponseBuilder {
    Response::builder()
        .header(SERVED_BY, SERVER_NAME)
        .header(TIMESTAMP, &timestamp())
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// A named artifact that could not be read.
#[derive(Debug)]
pub struct ArtifactError {
    file: String,
    source: io::Error,
}

impl ArtifactError {
    /// File name of the artifact, e.g. `users.json`.
    pub fn file(&self) -> &str {
        &self.file
    }
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifact {}: {}", self.file, self.source)
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Directory of `<name>.json` artifacts. Files are read on every request,
/// so edits on disk show up without a restart.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn file_name(name: &str) -> String {
        format!("{name}.json")
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(Self::file_name(name))
    }

    pub async fn load(&self, name: &str) -> Result<Vec<u8>, ArtifactError> {
        tokio::fs::read(self.path_of(name))
            .await
            .map_err(|source| ArtifactError { file: Self::file_name(name), source })
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Serves artifacts for matched route bindings. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    store: Arc<ArtifactStore>,
}

impl Dispatcher {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store: Arc::new(store) }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Answers `req` with the artifact `name`: 201 for POST, 200 otherwise,
    /// 500 if the artifact cannot be read.
    pub async fn serve(&self, req: Request, name: &str) -> Response {
        let method = req.method();
        if (method == http::Method::POST || method == http::Method::PUT) && !req.body().is_empty() {
            log_payload(&req);
        }

        let body = match self.store.load(name).await {
            Ok(body) => body,
            Err(e) => {
                error!(artifact = e.file(), error = %e.source, "failed to load artifact");
                let error = json!({
                    "error": "failed to load response artifact",
                    "artifact": e.file(),
                });
                return stamped()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .json(error.to_string().into_bytes());
            }
        };

        let status = if method == http::Method::POST {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        };
        stamped().status(status).json(body)
    }

    /// DELETE bindings: standard headers, 204, no artifact.
    pub fn delete(&self, req: &Request) -> Response {
        debug!(path = req.path(), "delete acknowledged");
        stamped()
            .status(StatusCode::NO_CONTENT)
            .header("content-type", crate::response::JSON)
            .no_body()
    }
}

/// Logs the request payload. Never rejects it.
fn log_payload(req: &Request) {
    match serde_json::from_slice::<serde_json::Value>(req.body()) {
        Ok(payload) => debug!(method = %req.method(), path = req.path(), %payload, "request payload"),
        Err(e) => warn!(
            method = %req.method(),
            path = req.path(),
            error = %e,
            "request body is not valid JSON, serving the artifact anyway"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use bytes::Bytes;

    use super::*;

    fn fixtures() -> ArtifactStore {
        ArtifactStore::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("responses"))
    }

    fn request(method: &str, uri: &str, body: &'static str) -> Request {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        Request::new(parts, Bytes::from_static(body.as_bytes()), ([127, 0, 0, 1], 9).into())
    }

    fn header<'a>(res: &'a Response, name: &str) -> Option<&'a str> {
        res.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn timestamp_is_rfc3339_utc_seconds() {
        let ts = timestamp();
        assert_eq!(ts.len(), "2024-05-01T12:00:00Z".len());
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[tokio::test]
    async fn load_reports_the_file_name() {
        let store = ArtifactStore::new("/definitely/not/here");
        let err = store.load("users").await.unwrap_err();
        assert_eq!(err.file(), "users.json");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn post_is_created_with_raw_artifact_bytes() {
        let dispatcher = Dispatcher::new(fixtures());
        let expected = std::fs::read(dispatcher.store().path_of("user")).unwrap();

        let res = dispatcher.serve(request("POST", "/users", "not json at all"), "user").await;

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.body(), expected.as_slice());
        assert_eq!(header(&res, "content-type"), Some("application/json"));
        assert_eq!(header(&res, SERVED_BY), Some(SERVER_NAME));
        assert!(header(&res, TIMESTAMP).is_some());
    }

    #[tokio::test]
    async fn get_is_ok() {
        let dispatcher = Dispatcher::new(fixtures());
        let res = dispatcher.serve(request("GET", "/products", ""), "products").await;
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_artifact_is_a_json_500() {
        let dispatcher = Dispatcher::new(fixtures());
        let res = dispatcher.serve(request("GET", "/ghosts", ""), "ghosts").await;

        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["artifact"], "ghosts.json");
    }

    #[test]
    fn delete_has_no_body() {
        let dispatcher = Dispatcher::new(fixtures());
        let res = dispatcher.delete(&request("DELETE", "/users/42", ""));

        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert_eq!(header(&res, "content-type"), Some("application/json"));
    }
}
