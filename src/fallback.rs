//! Catch-all handler for requests without a route binding.
//!
//! Exploratory clients hit paths the table does not know all the time, so
//! this answers `200 OK` with a JSON acknowledgment instead of a 404.

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::artifact::stamped;
use crate::request::Request;
use crate::response::Response;

pub const MESSAGE: &str = "no route is bound to this method and path; request recorded";

pub async fn acknowledge(req: Request) -> Response {
    warn!(method = %req.method(), path = req.path(), "no route binding matched");

    let headers: Map<String, Value> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.as_str().to_owned(), Value::String(value))
        })
        .collect();

    let body = json!({
        "message": MESSAGE,
        "method": req.method().as_str(),
        "path": req.path(),
        "query": req.query().unwrap_or_default(),
        "headers": headers,
        "body": String::from_utf8_lossy(req.body()),
    });

    stamped().json(body.to_string().into_bytes())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    #[tokio::test]
    async fn summarises_the_request() {
        let (parts, ()) = http::Request::builder()
            .method("PATCH")
            .uri("/nope/here?x=1")
            .header("x-api-key", "abc")
            .body(())
            .unwrap()
            .into_parts();
        let req = Request::new(parts, Bytes::from_static(b"raw"), ([127, 0, 0, 1], 2).into());

        let res = acknowledge(req).await;
        let body: Value = serde_json::from_slice(res.body()).unwrap();

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(body["method"], "PATCH");
        assert_eq!(body["path"], "/nope/here");
        assert_eq!(body["query"], "x=1");
        assert_eq!(body["headers"]["x-api-key"], "abc");
        assert_eq!(body["body"], "raw");
        assert_eq!(body["message"], MESSAGE);
    }
}
