//! Request/response recording.
//!
//! [`record`] wraps one request's trip through the rest of the pipeline:
//!
//! 1. drains the wire body into memory and re-exposes it on [`Request`],
//! 2. logs a [`RequestObservation`],
//! 3. runs the next stage and replays its [`Response`] through a
//!    [`Recording`] writer that forwards every call untouched while keeping
//!    a [`ResponseCapture`],
//! 4. logs the capture together with the elapsed time.
//!
//! Logging is write-only: nothing recorded here can change what the client
//! receives, and no failure here fails the request.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::request::Parts;
use http::{HeaderMap, StatusCode, Version};
use http_body_util::BodyExt;
use hyper::body::Body;
use tracing::{error, info};

use crate::request::{Request, is_json_media_type};
use crate::response::{Response, ResponseWriter};

// ── Request side ──────────────────────────────────────────────────────────────

/// Snapshot of an inbound request, taken once the body has been read.
#[derive(Clone, Debug)]
pub struct RequestObservation {
    pub method: String,
    pub url: String,
    pub path: String,
    pub query: String,
    pub version: Version,
    pub host: String,
    pub remote_addr: SocketAddr,
    pub content_length: Option<u64>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Decoded fields, for `application/x-www-form-urlencoded` bodies.
    pub form: Option<Vec<(String, String)>>,
    /// Parsed body, for JSON content types that parse.
    pub json: Option<serde_json::Value>,
}

impl RequestObservation {
    pub fn capture(parts: &Parts, remote_addr: SocketAddr, body: &Bytes) -> Self {
        let host = parts
            .uri
            .authority()
            .map(|a| a.as_str().to_owned())
            .or_else(|| header_text(&parts.headers, HOST))
            .unwrap_or_default();
        let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
        let url = match parts.uri.scheme_str() {
            Some(_) => parts.uri.to_string(),
            None if !host.is_empty() => format!("http://{host}{path_and_query}"),
            None => path_and_query.to_owned(),
        };

        let content_type = header_text(&parts.headers, CONTENT_TYPE).unwrap_or_default();
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        let form = media_type
            .eq_ignore_ascii_case("application/x-www-form-urlencoded")
            .then(|| url::form_urlencoded::parse(body).into_owned().collect());
        let json = if is_json_media_type(&content_type) && !body.is_empty() {
            serde_json::from_slice(body).ok()
        } else {
            None
        };

        Self {
            method: parts.method.to_string(),
            url,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().unwrap_or_default().to_owned(),
            version: parts.version,
            host,
            remote_addr,
            content_length: header_text(&parts.headers, CONTENT_LENGTH)
                .and_then(|v| v.trim().parse().ok()),
            headers: parts
                .headers
                .iter()
                .map(|(k, v)| (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
                .collect(),
            body: body.clone(),
            form,
            json,
        }
    }
}

fn header_text(headers: &HeaderMap, name: http::header::HeaderName) -> Option<String> {
    headers.get(name).map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

impl fmt::Display for RequestObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "request {} {} {:?}", self.method, self.url, self.version)?;
        writeln!(f, "  remote:         {}", self.remote_addr)?;
        writeln!(f, "  host:           {}", self.host)?;
        writeln!(f, "  path:           {}", self.path)?;
        writeln!(f, "  query:          {}", self.query)?;
        match self.content_length {
            Some(len) => writeln!(f, "  content-length: {len}")?,
            None => writeln!(f, "  content-length: -")?,
        }
        writeln!(f, "  headers:")?;
        for (name, value) in &self.headers {
            writeln!(f, "    {name}: {value}")?;
        }
        write!(f, "  body:           {}", String::from_utf8_lossy(&self.body))?;
        if let Some(form) = &self.form {
            write!(f, "\n  form:")?;
            for (key, value) in form {
                write!(f, "\n    {key} = {value}")?;
            }
        }
        if let Some(json) = &self.json {
            write!(f, "\n  json:           {json}")?;
        }
        Ok(())
    }
}

// ── Response side ─────────────────────────────────────────────────────────────

/// What went out on the wire for one request.
#[derive(Clone, Debug)]
pub struct ResponseCapture {
    status: StatusCode,
    status_written: bool,
    body: Vec<u8>,
}

impl Default for ResponseCapture {
    fn default() -> Self {
        Self { status: StatusCode::OK, status_written: false, body: Vec::new() }
    }
}

impl ResponseCapture {
    pub fn status(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn len(&self) -> usize { self.body.len() }
    pub fn is_empty(&self) -> bool { self.body.is_empty() }

    /// Multi-line summary including the elapsed handling time.
    pub fn summary(&self, elapsed: Duration) -> ResponseSummary<'_> {
        ResponseSummary { capture: self, elapsed }
    }
}

pub struct ResponseSummary<'a> {
    capture: &'a ResponseCapture,
    elapsed: Duration,
}

impl fmt::Display for ResponseSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "response {} in {:?}", self.capture.status, self.elapsed)?;
        writeln!(f, "  length: {}", self.capture.len())?;
        write!(f, "  body:   {}", String::from_utf8_lossy(&self.capture.body))
    }
}

/// [`ResponseWriter`] decorator that forwards every call to `inner` and keeps
/// a copy of the status and body.
pub struct Recording<'w, W: ?Sized> {
    inner: &'w mut W,
    capture: ResponseCapture,
}

impl<'w, W: ResponseWriter + ?Sized> Recording<'w, W> {
    pub fn new(inner: &'w mut W) -> Self {
        Self { inner, capture: ResponseCapture::default() }
    }

    pub fn capture(&self) -> &ResponseCapture {
        &self.capture
    }

    pub fn into_capture(self) -> ResponseCapture {
        self.capture
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for Recording<'_, W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        if !self.capture.status_written {
            self.capture.status = status;
            self.capture.status_written = true;
        }
        self.inner.write_status(status);
    }

    fn write(&mut self, chunk: &[u8]) {
        self.capture.status_written = true;
        self.capture.body.extend_from_slice(chunk);
        self.inner.write(chunk);
    }
}

// ── Pipeline stage ────────────────────────────────────────────────────────────

/// Records `req`, runs `next`, and writes its response through `writer`.
///
/// A body that fails to read is logged and replaced by an empty one.
pub async fn record<B, W, F, Fut>(
    req: http::Request<B>,
    remote_addr: SocketAddr,
    writer: &mut W,
    next: F,
) -> ResponseCapture
where
    B: Body<Data = Bytes>,
    B::Error: fmt::Display,
    W: ResponseWriter + ?Sized,
    F: FnOnce(Request) -> Fut,
    Fut: Future<Output = Response>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(
                method = %parts.method,
                path = parts.uri.path(),
                error = %e,
                "failed to read request body, continuing with an empty body"
            );
            Bytes::new()
        }
    };

    let observation = RequestObservation::capture(&parts, remote_addr, &body);
    info!(method = %observation.method, path = %observation.path, "{observation}");

    let response = next(Request::new(parts, body, remote_addr)).await;

    let mut recording = Recording::new(writer);
    response.write_to(&mut recording);
    let capture = recording.into_capture();

    let elapsed = started.elapsed();
    info!(
        status = capture.status().as_u16(),
        bytes = capture.len(),
        elapsed = ?elapsed,
        "{}",
        capture.summary(elapsed)
    );
    capture
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use http_body_util::Full;
    use hyper::body::Frame;

    use super::*;
    use crate::response::HttpWriter;

    fn remote() -> SocketAddr {
        ([10, 0, 0, 7], 5151).into()
    }

    fn parts(builder: http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    struct BrokenBody;

    impl Body for BrokenBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }
    }

    #[test]
    fn observation_builds_full_url_from_host_header() {
        let parts = parts(
            http::Request::builder()
                .uri("/users?page=2")
                .header("host", "api.local:8080"),
        );
        let obs = RequestObservation::capture(&parts, remote(), &Bytes::new());

        assert_eq!(obs.url, "http://api.local:8080/users?page=2");
        assert_eq!(obs.host, "api.local:8080");
        assert_eq!(obs.path, "/users");
        assert_eq!(obs.query, "page=2");
        assert_eq!(obs.content_length, None);
    }

    #[test]
    fn observation_parses_json_bodies() {
        let parts = parts(
            http::Request::builder()
                .method("POST")
                .header("content-type", "application/json")
                .header("content-length", "8"),
        );
        let obs = RequestObservation::capture(&parts, remote(), &Bytes::from_static(br#"{"a":[1]}"#));

        assert_eq!(obs.json, Some(serde_json::json!({"a": [1]})));
        assert_eq!(obs.content_length, Some(8));
        assert!(obs.form.is_none());
    }

    #[test]
    fn observation_keeps_malformed_json_as_raw_body_only() {
        let parts = parts(http::Request::builder().header("content-type", "application/json"));
        let obs = RequestObservation::capture(&parts, remote(), &Bytes::from_static(b"{oops"));

        assert!(obs.json.is_none());
        assert_eq!(obs.body, Bytes::from_static(b"{oops"));
    }

    #[test]
    fn observation_decodes_form_fields() {
        let parts = parts(
            http::Request::builder()
                .header("content-type", "application/x-www-form-urlencoded; charset=utf-8"),
        );
        let obs = RequestObservation::capture(&parts, remote(), &Bytes::from_static(b"name=Ada+L&age=36"));

        assert_eq!(
            obs.form,
            Some(vec![
                ("name".to_owned(), "Ada L".to_owned()),
                ("age".to_owned(), "36".to_owned()),
            ])
        );
    }

    #[test]
    fn observation_renders_one_field_per_line() {
        let parts = parts(
            http::Request::builder()
                .method("PUT")
                .uri("/users/3")
                .header("host", "h")
                .header("x-api-key", "k"),
        );
        let text = RequestObservation::capture(&parts, remote(), &Bytes::from_static(b"hi")).to_string();

        assert!(text.starts_with("request PUT http://h/users/3 HTTP/1.1\n"));
        assert!(text.contains("\n  remote:         10.0.0.7:5151\n"));
        assert!(text.contains("\n    x-api-key: k\n"));
        assert!(text.ends_with("  body:           hi"));
    }

    #[test]
    fn recording_defaults_to_ok() {
        let mut inner = HttpWriter::new();
        let recording = Recording::new(&mut inner);
        assert_eq!(recording.capture().status(), StatusCode::OK);
        assert!(recording.capture().is_empty());
    }

    #[test]
    fn recording_forwards_and_copies() {
        let mut inner = HttpWriter::new();
        let mut recording = Recording::new(&mut inner);

        recording.write_status(StatusCode::CREATED);
        recording.write_status(StatusCode::BAD_GATEWAY);
        recording.write(b"{\"id\":");
        recording.write(b"1}");
        let capture = recording.into_capture();

        assert_eq!(capture.status(), StatusCode::CREATED);
        assert_eq!(capture.body(), b"{\"id\":1}");

        let res = inner.into_response();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[test]
    fn recording_matches_implicit_ok_of_inner_writer() {
        let mut inner = HttpWriter::new();
        let mut recording = Recording::new(&mut inner);

        recording.write(b"x");
        recording.write_status(StatusCode::NOT_FOUND);

        assert_eq!(recording.capture().status(), StatusCode::OK);
        assert_eq!(inner.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn record_passes_the_body_downstream() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/echo")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();
        let mut writer = HttpWriter::new();

        let capture = record(req, remote(), &mut writer, |req| async move {
            Response::text(String::from_utf8_lossy(req.body()).into_owned())
        })
        .await;

        assert_eq!(capture.body(), b"payload");
        assert_eq!(capture.status(), StatusCode::OK);
        let res = writer.into_response();
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn unreadable_body_becomes_empty() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/users")
            .body(BrokenBody)
            .unwrap();
        let mut writer = HttpWriter::new();

        let capture = record(req, remote(), &mut writer, |req| async move {
            assert!(req.body().is_empty());
            Response::status(StatusCode::ACCEPTED)
        })
        .await;

        assert_eq!(capture.status(), StatusCode::ACCEPTED);
        assert_eq!(writer.status(), Some(StatusCode::ACCEPTED));
    }
}
