//! Coding tutor backend.
//!
//! - Axum HTTP API under `/api`
//! - Task generation, tutoring chat and solution evaluation through an
//!   OpenAI-compatible completion client
//! - Users, tasks, solutions and chat transcripts persisted in SQLite

pub mod config;
pub mod decode;
pub mod domain;
pub mod error;
pub mod extract;
pub mod extractors;
pub mod logic;
pub mod openai;
pub mod prompt;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;

pub use routes::build_router;
pub use state::AppState;
