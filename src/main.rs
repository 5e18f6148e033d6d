//! GeniusPAS · Exam Generator Backend
//!
//! - Axum HTTP API driving one exam document per session
//! - Gemini structured-output generation (via environment variables)
//! - Static SPA form (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   API_KEY           : Gemini API key (GEMINI_API_KEY also accepted); generation fails without it
//!   GEMINI_BASE_URL   : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL      : default "gemini-2.5-flash"
//!   AGENT_CONFIG_PATH : path to TOML config (prompt overrides)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"
//!   SESSION_TTL_SECS  : idle seconds before a session may be evicted (default 21600)

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod prompt;
mod gemini;
mod session;
mod render;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: in-memory sessions + Gemini-backed generator.
  let state = Arc::new(AppState::from_env()?);

  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "pas_generator", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "pas_generator", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "pas_generator", error = %e, "Failed to listen for ctrl-c");
  }
}
