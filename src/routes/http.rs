//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors become `{"error": ...}` via `TutorError`.

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  Json,
};
use tracing::{info, instrument};

use crate::domain::{ChatReply, Evaluation, TaskDraft};
use crate::error::TutorResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;
use crate::store::{FullStats, GeneralStats, LanguageStats, TaskDetail, TaskSummary};

fn message(text: &str) -> Json<MessageOut> {
  Json(MessageOut { message: text.into() })
}

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(username = %body.username))]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CredentialsIn>,
) -> TutorResult<(StatusCode, Json<MessageOut>)> {
  logic::register(&state, &body.username, &body.password).await?;
  Ok((StatusCode::CREATED, message("User registered successfully")))
}

#[instrument(level = "info", skip(state, body), fields(username = %body.username))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CredentialsIn>,
) -> TutorResult<Json<LoginOut>> {
  Ok(Json(logic::login(&state, &body.username, &body.password).await?))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_interact(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<InteractIn>,
) -> TutorResult<Json<InteractOut>> {
  Ok(Json(logic::interact(&state, body).await?))
}

#[instrument(level = "info", skip(state, body), fields(language = %body.language, level = %body.level))]
pub async fn http_generate_task(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<GenerateTaskIn>,
) -> TutorResult<Json<TaskDraft>> {
  Ok(Json(logic::generate_task(&state, body).await?))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_save_task(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<SaveTaskIn>,
) -> TutorResult<Json<SaveTaskOut>> {
  let task_id = logic::save_task(&state, body).await?;
  Ok(Json(SaveTaskOut { task_id, message: "Task saved successfully".into() }))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, task_id = body.task_id))]
pub async fn http_evaluate_task(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<EvaluateIn>,
) -> TutorResult<Json<Evaluation>> {
  Ok(Json(logic::evaluate_solution(&state, body).await?))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, task_id = body.task_id))]
pub async fn http_task_chat(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<ChatIn>,
) -> TutorResult<Json<ChatReply>> {
  Ok(Json(logic::send_chat(&state, body).await?))
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_user_tasks(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<UserQuery>,
) -> TutorResult<Json<Vec<TaskSummary>>> {
  let tasks = state.db.list_tasks(q.user_id).await?;
  info!(target: "coding_tutor", user_id = q.user_id, count = tasks.len(), "Tasks listed");
  Ok(Json(tasks))
}

#[instrument(level = "info", skip(state))]
pub async fn http_single_task(
  State(state): State<Arc<AppState>>,
  ApiPath(task_id): ApiPath<i64>,
) -> TutorResult<Json<TaskDetail>> {
  Ok(Json(state.db.get_task(task_id).await?))
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_stats_general(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<UserQuery>,
) -> TutorResult<Json<GeneralStats>> {
  Ok(Json(state.db.general_stats(q.user_id).await?))
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_stats_full(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<UserQuery>,
) -> TutorResult<Json<FullStats>> {
  Ok(Json(state.db.full_stats(q.user_id).await?))
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id, language = %q.language))]
pub async fn http_stats_language(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<LanguageQuery>,
) -> TutorResult<Json<LanguageStats>> {
  Ok(Json(state.db.language_stats(q.user_id, &q.language).await?))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_change_username(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<ChangeUsernameIn>,
) -> TutorResult<Json<MessageOut>> {
  logic::change_username(&state, body.user_id, &body.username).await?;
  Ok(message("Username changed successfully"))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_change_password(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<ChangePasswordIn>,
) -> TutorResult<Json<MessageOut>> {
  logic::change_password(&state, body.user_id, &body.old_password, &body.new_password).await?;
  Ok(message("Password changed successfully"))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_delete_account(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<DeleteAccountIn>,
) -> TutorResult<Json<MessageOut>> {
  state.db.delete_account(body.user_id).await?;
  Ok(message("Account deleted successfully"))
}
