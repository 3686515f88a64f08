//! Pipeline stages that run around every routed handler.
//!
//! - [`cors`]: origin policy and the preflight short-circuit inputs
//! - [`recorder`]: request observation and response capture, logged through
//!   `tracing`
//!
//! [`App::handle`](crate::App::handle) chains them: CORS headers first, then
//! the recorder wrapping the router.

pub mod cors;
pub mod recorder;
