//! Coding tutor backend binary.
//!
//! Important env variables (a `.env` file is loaded when present):
//!   PORT                 : u16 (default 8080)
//!   DATABASE_PATH        : SQLite file (default /data/tutor.db if /data exists, else ./tutor.db)
//!   CORS_ALLOWED_ORIGINS : comma-separated origins
//!   OPENAI_API_KEY       : enables the completion client if present
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_MODEL         : default "gpt-4-turbo"
//!   OPENAI_TIMEOUT_SECS  : default 60
//!   TUTOR_CONFIG_PATH    : path to TOML config with a [prompts] table
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use coding_tutor_backend::{build_router, config::AppConfig, store::Database, telemetry, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let dotenv = dotenvy::dotenv();
  telemetry::init_tracing();
  if let Err(e) = dotenv {
    warn!(target: "coding_tutor", error = %e, "No .env file loaded, using process environment");
  }

  let config = AppConfig::from_env();
  let db = Database::connect(&config.database_path).await?;
  let state = Arc::new(AppState::from_config(&config, db)?);

  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "coding_tutor", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "coding_tutor", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "coding_tutor", error = %e, "Failed to listen for ctrl-c");
  }
}
