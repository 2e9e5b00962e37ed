//! Core behaviors behind the HTTP handlers.
//!
//! AI-backed operations share one pipeline: render the prompt, call the
//! completion service, extract the JSON object, decode it into the expected
//! shape. Nothing is retried and nothing is papered over; the first failure is
//! returned to the handler.

use std::time::Instant;

use tracing::{debug, error, info, instrument};

use crate::decode::{parse_completion, ModelResponse};
use crate::domain::{ChatReply, Evaluation, Role, TaskDraft, TurnTiming};
use crate::error::TutorError;
use crate::prompt::{
  build_prompt, ChatPromptContext, EvaluationPromptContext, PromptContext, TaskPromptContext,
};
use crate::protocol::{
  ChatIn, EvaluateIn, GenerateTaskIn, InteractIn, InteractOut, LoginOut, SaveTaskIn,
};
use crate::state::AppState;
use crate::store::{ConversationStore, NewSolution, NewTask, TRANSCRIPT_WINDOW};
use crate::util::trunc_for_log;

fn require(value: &str, field: &str) -> Result<(), TutorError> {
  if value.trim().is_empty() {
    return Err(TutorError::validation(format!("{field} must not be empty")));
  }
  Ok(())
}

/// Prompt → completion → extraction → decode, for the shape `T`.
#[instrument(level = "info", skip(state, ctx), fields(kind = T::KIND.as_str()))]
pub async fn ask_model<T: ModelResponse>(state: &AppState, ctx: &PromptContext) -> Result<T, TutorError> {
  debug_assert_eq!(ctx.kind(), T::KIND);
  let client = state.completion()?;
  let prompt = build_prompt(&state.prompts, ctx);
  debug!(target: "tutor_ai", prompt_len = prompt.len(), model = client.model(), "Prompt rendered");

  let raw = client.complete(&state.prompts.system, &prompt).await?;
  parse_completion::<T>(&raw).map_err(|e| {
    error!(target: "tutor_ai", kind = T::KIND.as_str(), error = %e, raw = %trunc_for_log(&raw, 500), "Unusable model output");
    e
  })
}

#[instrument(level = "info", skip(state, req), fields(language = %req.language, level = %req.level))]
pub async fn generate_task(state: &AppState, req: GenerateTaskIn) -> Result<TaskDraft, TutorError> {
  require(&req.language, "language")?;
  let ctx = PromptContext::Task(TaskPromptContext {
    language: req.language,
    level: req.level,
    comment: req.comment,
  });
  let draft: TaskDraft = ask_model(state, &ctx).await?;
  info!(target: "coding_tutor", minutes = draft.time_estimation_minutes, "Task generated");
  Ok(draft)
}

#[instrument(level = "info", skip(state, req), fields(user_id = req.user_id))]
pub async fn save_task(state: &AppState, req: SaveTaskIn) -> Result<i64, TutorError> {
  require(&req.description, "description")?;
  require(&req.language, "language")?;
  state
    .db
    .insert_task(&NewTask {
      user_id: req.user_id,
      description: req.description,
      language: req.language,
      level: req.level,
      time_estimated: req.time_estimated,
    })
    .await
}

/// Grade a submission and store it with the normalized mark.
#[instrument(level = "info", skip(state, req), fields(user_id = req.user_id, task_id = req.task_id, code_len = req.code.len()))]
pub async fn evaluate_solution(state: &AppState, req: EvaluateIn) -> Result<Evaluation, TutorError> {
  require(&req.code, "code")?;
  let ctx = PromptContext::Evaluation(EvaluationPromptContext {
    task: req.task,
    code: req.code.clone(),
    level: req.level,
    language: req.language,
    ai_usage: req.use_ai,
    time_estimation: req.time_estimation,
    time_spent: req.time_spent,
  });
  let evaluation: Evaluation = ask_model(state, &ctx).await?;

  state
    .db
    .insert_solution(&NewSolution {
      task_id: req.task_id,
      code: req.code,
      rating: evaluation.rating.clone(),
      mark: evaluation.mark,
      ai_usage: req.use_ai,
      time_spent: req.time_spent,
    })
    .await?;
  info!(target: "coding_tutor", task_id = req.task_id, mark = evaluation.mark, "Solution evaluated");
  Ok(evaluation)
}

/// One chat turn about a task.
///
/// The student's turn is stored before the model is called, so it survives an
/// upstream or parsing failure. The assistant's turn is stored only after a
/// successful decode, and only the decoded message, never the raw completion.
#[instrument(level = "info", skip(state, req), fields(user_id = req.user_id, task_id = req.task_id, message_len = req.message.len()))]
pub async fn send_chat(state: &AppState, req: ChatIn) -> Result<ChatReply, TutorError> {
  require(&req.message, "message")?;
  let store: &dyn ConversationStore = &state.db;

  store
    .append(
      req.user_id,
      req.task_id,
      Role::User,
      &req.message,
      TurnTiming { time_remaining: req.time_remaining, time_spent: req.time_spent },
    )
    .await?;

  let history = store.recent_turns(req.task_id, TRANSCRIPT_WINDOW).await?;
  let ctx = PromptContext::Chat(ChatPromptContext {
    message: req.message,
    level: req.level,
    language: req.language,
    task: req.task,
    history,
  });
  let reply: ChatReply = ask_model(state, &ctx).await?;

  store
    .append(req.user_id, req.task_id, Role::Assistant, &reply.message, TurnTiming::default())
    .await?;
  Ok(reply)
}

/// Free-form question, answered with the raw completion text.
#[instrument(level = "info", skip(state, req), fields(user_id = req.user_id, input_len = req.input.len()))]
pub async fn interact(state: &AppState, req: InteractIn) -> Result<InteractOut, TutorError> {
  require(&req.input, "input")?;
  let client = state.completion()?;
  let start = Instant::now();
  let response = client.complete(&state.prompts.system, &req.input).await?;
  let duration_secs = start.elapsed().as_secs();
  info!(target: "coding_tutor", duration_secs, response_len = response.len(), "Interaction answered");
  Ok(InteractOut { user_id: req.user_id, input: req.input, response, duration_secs })
}

//
// Accounts
//

#[instrument(level = "info", skip(state, password))]
pub async fn register(state: &AppState, username: &str, password: &str) -> Result<i64, TutorError> {
  require(username, "username")?;
  require(password, "password")?;
  let hash = hash_password(password)?;
  state.db.create_user(username.trim(), &hash).await
}

#[instrument(level = "info", skip(state, password))]
pub async fn login(state: &AppState, username: &str, password: &str) -> Result<LoginOut, TutorError> {
  let invalid = || TutorError::unauthorized("invalid credentials");
  let user = state.db.find_user_by_name(username.trim()).await?.ok_or_else(invalid)?;
  let hash = user.password.ok_or_else(invalid)?;
  if !verify_password(password, &hash) {
    return Err(invalid());
  }
  info!(target: "coding_tutor", user_id = user.id, "Login succeeded");
  Ok(LoginOut { message: "Login successful".into(), user_id: user.id })
}

#[instrument(level = "info", skip(state))]
pub async fn change_username(state: &AppState, user_id: i64, username: &str) -> Result<(), TutorError> {
  require(username, "username")?;
  state.db.update_username(user_id, username.trim()).await
}

#[instrument(level = "info", skip(state, old_password, new_password))]
pub async fn change_password(
  state: &AppState,
  user_id: i64,
  old_password: &str,
  new_password: &str,
) -> Result<(), TutorError> {
  require(new_password, "new_password")?;
  let current = state
    .db
    .password_hash(user_id)
    .await?
    .ok_or_else(|| TutorError::unauthorized("user not found"))?;
  if !verify_password(old_password, &current) {
    return Err(TutorError::unauthorized("old password is incorrect"));
  }
  let hash = hash_password(new_password)?;
  state.db.update_password(user_id, &hash).await
}

fn hash_password(password: &str) -> Result<String, TutorError> {
  Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Malformed stored hashes count as a mismatch.
fn verify_password(password: &str, hash: &str) -> bool {
  bcrypt::verify(password, hash).unwrap_or(false)
}
