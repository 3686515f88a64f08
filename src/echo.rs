//! `/echo`: hands the request body straight back.

use tracing::debug;

use crate::request::Request;
use crate::response::{Response, TEXT};

/// JSON bodies with a JSON content type come back re-serialized; anything
/// else comes back byte for byte as `text/plain`.
pub async fn echo(req: Request) -> Response {
    if req.is_json() {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(req.body()) {
            match serde_json::to_vec(&value) {
                Ok(bytes) => return Response::json(bytes),
                Err(e) => debug!(error = %e, "re-serializing echo payload failed"),
            }
        }
    }
    Response::builder().bytes(TEXT, req.body().to_vec())
}
