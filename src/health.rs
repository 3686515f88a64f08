//! Liveness endpoint.
//!
//! `GET /health` answers without touching the artifact store: if the process
//! can respond to HTTP at all, it is alive.
//!
//! ```json
//! {"status":"healthy","timestamp":"2024-05-01T12:00:00Z","server":"decoy"}
//! ```

use serde_json::json;

use crate::artifact::{stamped, timestamp};
use crate::request::Request;
use crate::response::Response;
use crate::SERVER_NAME;

pub async fn liveness(_req: Request) -> Response {
    let body = json!({
        "status": "healthy",
        "timestamp": timestamp(),
        "server": SERVER_NAME,
    });
    stamped().json(body.to_string().into_bytes())
}
