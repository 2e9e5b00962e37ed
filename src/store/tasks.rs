//! Saved exercises and their graded solutions.

use serde::Serialize;
use tracing::{info, instrument};

use super::{Database, InteractionRecord};
use crate::domain::Level;
use crate::error::TutorError;

#[derive(Clone, Debug)]
pub struct NewTask {
  pub user_id: i64,
  pub description: String,
  pub language: String,
  pub level: Level,
  pub time_estimated: i64,
}

#[derive(Clone, Debug)]
pub struct NewSolution {
  pub task_id: i64,
  pub code: String,
  pub rating: String,
  pub mark: f64,
  pub ai_usage: bool,
  pub time_spent: i64,
}

/// Row of the task overview list; solution columns are empty for open tasks.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct TaskSummary {
  pub id: i64,
  pub description: String,
  pub language: String,
  pub mark: Option<f64>,
  pub level: String,
  pub ai_usage: i64,
  pub time_spent: i64,
  pub time_estimated: i64,
  pub rating: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct TaskDetail {
  pub id: i64,
  pub description: String,
  pub level: String,
  pub language: String,
  pub mark: Option<f64>,
  pub rating: String,
  pub time_spent: i64,
  pub time_estimated: i64,
  pub ai_usage: i64,
  pub code: String,
  #[sqlx(skip)]
  pub interactions: Vec<InteractionRecord>,
}

impl Database {
  /// Language is stored lower-cased so statistics group case-insensitively.
  #[instrument(level = "info", skip(self, task), fields(user_id = task.user_id, level = %task.level))]
  pub async fn insert_task(&self, task: &NewTask) -> Result<i64, TutorError> {
    let id = sqlx::query(
      r#"
      INSERT INTO tasks (user_id, description, language, level, time_estimated)
      VALUES (?, ?, ?, ?, ?)
      "#,
    )
    .bind(task.user_id)
    .bind(&task.description)
    .bind(task.language.to_lowercase())
    .bind(task.level.as_str())
    .bind(task.time_estimated)
    .execute(self.pool())
    .await?
    .last_insert_rowid();
    info!(target: "tutor_store", task_id = id, "Task saved");
    Ok(id)
  }

  #[instrument(level = "info", skip(self, solution), fields(task_id = solution.task_id, mark = solution.mark))]
  pub async fn insert_solution(&self, solution: &NewSolution) -> Result<i64, TutorError> {
    let id = sqlx::query(
      r#"
      INSERT INTO solutions (task_id, code, rating, mark, ai_usage, time_spent)
      VALUES (?, ?, ?, ?, ?, ?)
      "#,
    )
    .bind(solution.task_id)
    .bind(&solution.code)
    .bind(&solution.rating)
    .bind(solution.mark)
    .bind(solution.ai_usage)
    .bind(solution.time_spent)
    .execute(self.pool())
    .await?
    .last_insert_rowid();
    Ok(id)
  }

  pub async fn list_tasks(&self, user_id: i64) -> Result<Vec<TaskSummary>, TutorError> {
    let rows = sqlx::query_as::<_, TaskSummary>(
      r#"
      SELECT
        tasks.id,
        tasks.description,
        COALESCE(tasks.language, '') AS language,
        solutions.mark,
        COALESCE(tasks.level, '') AS level,
        COALESCE(solutions.ai_usage, 0) AS ai_usage,
        COALESCE(solutions.time_spent, 0) AS time_spent,
        COALESCE(tasks.time_estimated, 0) AS time_estimated,
        solutions.rating
      FROM tasks
        LEFT JOIN solutions ON tasks.id = solutions.task_id
      WHERE tasks.user_id = ?
      ORDER BY tasks.id
      "#,
    )
    .bind(user_id)
    .fetch_all(self.pool())
    .await?;
    Ok(rows)
  }

  /// One task with its solution (if any) and full transcript.
  pub async fn get_task(&self, task_id: i64) -> Result<TaskDetail, TutorError> {
    let mut task = sqlx::query_as::<_, TaskDetail>(
      r#"
      SELECT
        tasks.id,
        tasks.description,
        COALESCE(tasks.level, '') AS level,
        COALESCE(tasks.language, '') AS language,
        solutions.mark,
        COALESCE(solutions.rating, 'No rating') AS rating,
        COALESCE(solutions.time_spent, 0) AS time_spent,
        COALESCE(tasks.time_estimated, 0) AS time_estimated,
        COALESCE(solutions.ai_usage, 0) AS ai_usage,
        COALESCE(solutions.code, '') AS code
      FROM tasks
        LEFT JOIN solutions ON tasks.id = solutions.task_id
      WHERE tasks.id = ?
      "#,
    )
    .bind(task_id)
    .fetch_optional(self.pool())
    .await?
    .ok_or_else(|| TutorError::not_found(format!("task {task_id} not found")))?;

    task.interactions = self.interactions_for_task(task_id).await?;
    Ok(task)
  }
}
