//! HTTP request/response DTOs (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::Level;

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct MessageOut {
  pub message: String,
}

//
// Accounts
//

#[derive(Deserialize)]
pub struct CredentialsIn {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginOut {
  pub message: String,
  pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
  pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
  pub user_id: i64,
  pub language: String,
}

#[derive(Deserialize)]
pub struct ChangeUsernameIn {
  pub user_id: i64,
  pub username: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordIn {
  pub user_id: i64,
  pub old_password: String,
  pub new_password: String,
}

#[derive(Deserialize)]
pub struct DeleteAccountIn {
  pub user_id: i64,
}

//
// Tasks
//

#[derive(Debug, Deserialize)]
pub struct GenerateTaskIn {
  pub language: String,
  pub level: Level,
  #[serde(default)]
  pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveTaskIn {
  pub user_id: i64,
  pub description: String,
  pub language: String,
  pub level: Level,
  pub time_estimated: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveTaskOut {
  pub task_id: i64,
  pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateIn {
  pub user_id: i64,
  pub task_id: i64,
  pub code: String,
  pub level: Level,
  pub language: String,
  pub task: String,
  #[serde(default)]
  pub use_ai: bool,
  pub time_estimation: i64,
  pub time_spent: i64,
}

//
// Chat
//

#[derive(Debug, Deserialize)]
pub struct ChatIn {
  pub user_id: i64,
  pub task_id: i64,
  pub message: String,
  pub level: Level,
  #[serde(default)]
  pub language: String,
  pub task: String,
  #[serde(default)]
  pub time_remaining: Option<i64>,
  #[serde(default)]
  pub time_spent: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct InteractIn {
  pub user_id: i64,
  pub input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InteractOut {
  pub user_id: i64,
  pub input: String,
  pub response: String,
  pub duration_secs: u64,
}
