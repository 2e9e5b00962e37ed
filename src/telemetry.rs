//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL controls the filter, either a single level ("debug") or full
//!   directives such as "info,coding_tutor=debug,tutor_ai=trace,tutor_store=info".
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets in use: `coding_tutor` (handlers/logic), `tutor_ai` (completion
//! client and response decoding), `tutor_store` (SQLite).

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,coding_tutor=debug,tutor_ai=debug,tutor_store=info,tower_http=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Separate arms: the json and pretty builders are different types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
