//! The background process: one JSON request per stdin line, one response
//! envelope per stdout line, for as long as the UI keeps the pipe open.

use eyre::Context;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tubedeck::auth::OAuthProvider;
use tubedeck::build_core;
use tubedeck::gateway::HttpTransport;
use tubedeck::storage::FileStore;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        // Logs go to stderr; stdout carries only response envelopes.
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let client_id = std::env::var("TUBEDECK_CLIENT_ID").context("read TUBEDECK_CLIENT_ID")?;
    let client_secret =
        std::env::var("TUBEDECK_CLIENT_SECRET").context("read TUBEDECK_CLIENT_SECRET")?;
    let state_path =
        std::env::var("TUBEDECK_STATE").unwrap_or_else(|_| "tubedeck-state.json".to_owned());

    let store = Arc::new(FileStore::new(state_path));
    let provider =
        Arc::new(OAuthProvider::new(client_id, client_secret).context("build OAuth provider")?);
    let transport = Arc::new(HttpTransport::new().context("build HTTP transport")?);

    let router = build_core(store, provider, transport);
    router.restore_session().await;
    tracing::info!("background core ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await.context("read request line")? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str(&line) {
            Ok(request) => router.dispatch(request).await,
            Err(error) => tubedeck::router::UiResponse::err(format!("invalid request: {error}")),
        };
        let mut payload = serde_json::to_vec(&response).context("serialize response")?;
        payload.push(b'\n');
        stdout.write_all(&payload).await.context("write response")?;
        stdout.flush().await.context("flush response")?;
    }

    tracing::info!("request stream closed, shutting down");
    Ok(())
}
