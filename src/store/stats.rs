//! Per-user usage statistics over tasks and solutions.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Database;
use crate::error::TutorError;

#[derive(Clone, Debug, Default, Serialize)]
pub struct GeneralStats {
  pub avg_mark: f64,
  /// Percentage of solved tasks where AI was used; `None` before the first solution.
  pub ai_usage_rate: Option<f64>,
  pub total_tasks: i64,
  pub completed_tasks: i64,
  pub language_usage: BTreeMap<String, i64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompletionSplit {
  pub completed: i64,
  pub not_completed: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AiSplit {
  pub with_ai: i64,
  pub without_ai: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct FullStats {
  pub avg_mark: f64,
  pub ai_usage_rate: Option<f64>,
  pub total_tasks: i64,
  pub completed_tasks: i64,
  pub language_distribution: BTreeMap<String, i64>,
  pub task_status_chart: BTreeMap<String, CompletionSplit>,
  pub ai_usage_chart: BTreeMap<String, AiSplit>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LanguageStats {
  pub total_tasks: i64,
  pub completed_tasks: i64,
  pub ai_with_usage: i64,
  pub ai_without_usage: i64,
  pub task_levels: BTreeMap<String, i64>,
  pub avg_mark: f64,
}

const SUMMARY_SQL: &str = r#"
  SELECT
    COALESCE(AVG(solutions.mark), 0.0) AS avg_mark,
    (COUNT(CASE WHEN solutions.ai_usage > 0 THEN 1 END) * 100.0 /
     NULLIF(COUNT(CASE WHEN solutions.task_id IS NOT NULL THEN 1 END), 0)) AS ai_usage_rate,
    COUNT(tasks.id) AS total_tasks,
    COALESCE(SUM(CASE WHEN solutions.task_id IS NOT NULL THEN 1 ELSE 0 END), 0) AS completed_tasks
  FROM tasks
    LEFT JOIN solutions ON tasks.id = solutions.task_id
  WHERE tasks.user_id = ?
"#;

impl Database {
  async fn summary(&self, user_id: i64) -> Result<(f64, Option<f64>, i64, i64), TutorError> {
    let row = sqlx::query_as(SUMMARY_SQL)
      .bind(user_id)
      .fetch_one(self.pool())
      .await?;
    Ok(row)
  }

  async fn language_distribution(&self, user_id: i64) -> Result<BTreeMap<String, i64>, TutorError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
      "SELECT COALESCE(language, '') AS language, COUNT(*) FROM tasks WHERE user_id = ? GROUP BY language",
    )
    .bind(user_id)
    .fetch_all(self.pool())
    .await?;
    Ok(rows.into_iter().collect())
  }

  pub async fn general_stats(&self, user_id: i64) -> Result<GeneralStats, TutorError> {
    let (avg_mark, ai_usage_rate, total_tasks, completed_tasks) = self.summary(user_id).await?;
    Ok(GeneralStats {
      avg_mark,
      ai_usage_rate,
      total_tasks,
      completed_tasks,
      language_usage: self.language_distribution(user_id).await?,
    })
  }

  pub async fn full_stats(&self, user_id: i64) -> Result<FullStats, TutorError> {
    let (avg_mark, ai_usage_rate, total_tasks, completed_tasks) = self.summary(user_id).await?;

    let status_rows: Vec<(String, i64, i64)> = sqlx::query_as(
      r#"
      SELECT COALESCE(tasks.language, '') AS language,
             COALESCE(SUM(CASE WHEN solutions.mark IS NOT NULL THEN 1 ELSE 0 END), 0) AS completed,
             COALESCE(SUM(CASE WHEN solutions.mark IS NULL THEN 1 ELSE 0 END), 0) AS not_completed
      FROM tasks
        LEFT JOIN solutions ON tasks.id = solutions.task_id
      WHERE tasks.user_id = ?
      GROUP BY tasks.language
      "#,
    )
    .bind(user_id)
    .fetch_all(self.pool())
    .await?;

    let ai_rows: Vec<(String, i64, i64)> = sqlx::query_as(
      r#"
      SELECT COALESCE(tasks.language, '') AS language,
             COALESCE(SUM(CASE WHEN solutions.ai_usage = 1 THEN 1 ELSE 0 END), 0) AS with_ai,
             COALESCE(SUM(CASE WHEN solutions.ai_usage = 0 THEN 1 ELSE 0 END), 0) AS without_ai
      FROM tasks
        LEFT JOIN solutions ON tasks.id = solutions.task_id
      WHERE tasks.user_id = ?
      GROUP BY tasks.language
      "#,
    )
    .bind(user_id)
    .fetch_all(self.pool())
    .await?;

    Ok(FullStats {
      avg_mark,
      ai_usage_rate,
      total_tasks,
      completed_tasks,
      language_distribution: self.language_distribution(user_id).await?,
      task_status_chart: status_rows
        .into_iter()
        .map(|(lang, completed, not_completed)| (lang, CompletionSplit { completed, not_completed }))
        .collect(),
      ai_usage_chart: ai_rows
        .into_iter()
        .map(|(lang, with_ai, without_ai)| (lang, AiSplit { with_ai, without_ai }))
        .collect(),
    })
  }

  /// Stats restricted to one (lower-cased) language.
  pub async fn language_stats(&self, user_id: i64, language: &str) -> Result<LanguageStats, TutorError> {
    let language = language.to_lowercase();

    let (total_tasks, completed_tasks, avg_mark): (i64, i64, f64) = sqlx::query_as(
      r#"
      SELECT
        (SELECT COUNT(*) FROM tasks WHERE language = ?1 AND user_id = ?2) AS total_tasks,
        COUNT(solutions.id) AS completed_tasks,
        COALESCE(AVG(solutions.mark), 0.0) AS avg_mark
      FROM tasks
        JOIN solutions ON tasks.id = solutions.task_id
      WHERE tasks.language = ?1 AND tasks.user_id = ?2
      "#,
    )
    .bind(&language)
    .bind(user_id)
    .fetch_one(self.pool())
    .await?;

    let (ai_with_usage, ai_without_usage): (i64, i64) = sqlx::query_as(
      r#"
      SELECT
        COUNT(CASE WHEN solutions.ai_usage > 0 THEN 1 END) AS ai_with_usage,
        COUNT(CASE WHEN solutions.ai_usage = 0 THEN 1 END) AS ai_without_usage
      FROM tasks
        JOIN solutions ON tasks.id = solutions.task_id
      WHERE tasks.language = ? AND tasks.user_id = ?
      "#,
    )
    .bind(&language)
    .bind(user_id)
    .fetch_one(self.pool())
    .await?;

    let level_rows: Vec<(String, i64)> = sqlx::query_as(
      r#"
      SELECT COALESCE(level, '') AS level, COUNT(*)
      FROM tasks
      WHERE language = ? AND user_id = ?
      GROUP BY level
      "#,
    )
    .bind(&language)
    .bind(user_id)
    .fetch_all(self.pool())
    .await?;

    Ok(LanguageStats {
      total_tasks,
      completed_tasks,
      ai_with_usage,
      ai_without_usage,
      task_levels: level_rows.into_iter().collect(),
      avg_mark,
    })
  }
}
