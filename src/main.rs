//! `decoy` binary: reads the environment, then serves until SIGTERM / Ctrl-C.
//!
//!   PORT=8080 ALLOWED_ORIGINS=https://app.local ALLOW_CREDENTIALS=true \
//!   ARTIFACT_DIR=responses RUST_LOG=info decoy

use decoy::{App, Config, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), decoy::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(
        port = config.port,
        allowed_origins = ?config.allowed_origins,
        allow_credentials = config.allow_credentials,
        artifact_dir = %config.artifact_dir.display(),
        "configuration loaded"
    );

    Server::bind(config.addr()).serve(App::new(&config)).await
}
