//! Chat transcript rows (`interactions` table).

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{ConversationStore, Database};
use crate::domain::{ConversationTurn, Role, TurnTiming};
use crate::error::TutorError;

/// Full transcript row, as returned with a single task.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct InteractionRecord {
  pub id: i64,
  pub user_id: i64,
  pub task_id: i64,
  pub role: String,
  pub content: String,
  pub time_remaining: Option<i64>,
  pub time_spent: Option<i64>,
  pub category_id: Option<i64>,
}

impl Database {
  pub async fn interactions_for_task(&self, task_id: i64) -> Result<Vec<InteractionRecord>, TutorError> {
    let rows = sqlx::query_as::<_, InteractionRecord>(
      r#"
      SELECT id, user_id, task_id, role, content, time_remaining, time_spent, category_id
      FROM interactions
      WHERE task_id = ?
      ORDER BY id
      "#,
    )
    .bind(task_id)
    .fetch_all(self.pool())
    .await?;
    Ok(rows)
  }
}

#[async_trait]
impl ConversationStore for Database {
  #[instrument(level = "debug", skip(self, content), fields(role = role.as_str(), content_len = content.len()))]
  async fn append(
    &self,
    user_id: i64,
    task_id: i64,
    role: Role,
    content: &str,
    timing: TurnTiming,
  ) -> Result<i64, TutorError> {
    let id = sqlx::query(
      r#"
      INSERT INTO interactions (user_id, task_id, role, content, time_remaining, time_spent)
      VALUES (?, ?, ?, ?, ?, ?)
      "#,
    )
    .bind(user_id)
    .bind(task_id)
    .bind(role.as_str())
    .bind(content)
    .bind(timing.time_remaining)
    .bind(timing.time_spent)
    .execute(self.pool())
    .await?
    .last_insert_rowid();
    debug!(target: "tutor_store", id, task_id, "Turn appended");
    Ok(id)
  }

  #[instrument(level = "debug", skip(self))]
  async fn recent_turns(&self, task_id: i64, limit: u32) -> Result<Vec<ConversationTurn>, TutorError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
      "SELECT role, content FROM interactions WHERE task_id = ? ORDER BY id DESC LIMIT ?",
    )
    .bind(task_id)
    .bind(i64::from(limit))
    .fetch_all(self.pool())
    .await?;

    // Newest first from the query; prompts want oldest first.
    rows
      .into_iter()
      .rev()
      .map(|(role, content)| {
        let role: Role = role.parse()?;
        Ok::<_, TutorError>(ConversationTurn { role, content })
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Level;
  use crate::store::NewTask;

  async fn seeded() -> (Database, i64, i64) {
    let db = Database::in_memory().await.unwrap();
    let user = db.create_user("ada", "hash").await.unwrap();
    let task = db
      .insert_task(&NewTask {
        user_id: user,
        description: "Print numbers 1 to 10".into(),
        language: "python".into(),
        level: Level::Easy,
        time_estimated: 5,
      })
      .await
      .unwrap();
    (db, user, task)
  }

  #[tokio::test]
  async fn empty_transcript_is_not_an_error() {
    let (db, _, task) = seeded().await;
    assert!(db.recent_turns(task, 10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn window_keeps_latest_turns_oldest_first() {
    let (db, user, task) = seeded().await;
    for i in 0..12 {
      let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
      db.append(user, task, role, &format!("turn {i}"), TurnTiming::default())
        .await
        .unwrap();
    }
    let turns = db.recent_turns(task, 10).await.unwrap();
    assert_eq!(turns.len(), 10);
    assert_eq!(turns.first().unwrap().content, "turn 2");
    assert_eq!(turns.last().unwrap().content, "turn 11");
    assert_eq!(turns.last().unwrap().role, Role::Assistant);
  }

  #[tokio::test]
  async fn timing_is_stored_with_the_turn() {
    let (db, user, task) = seeded().await;
    let timing = TurnTiming { time_remaining: Some(120), time_spent: Some(60) };
    db.append(user, task, Role::User, "How do I start?", timing).await.unwrap();
    db.append(user, task, Role::Assistant, "Use a for loop.", TurnTiming::default())
      .await
      .unwrap();

    let rows = db.interactions_for_task(task).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].role, "user");
    assert_eq!(rows[0].time_remaining, Some(120));
    assert_eq!(rows[0].time_spent, Some(60));
    assert_eq!(rows[1].role, "assistant");
    assert_eq!(rows[1].time_spent, None);
  }

  #[tokio::test]
  async fn unknown_task_is_rejected_by_foreign_key() {
    let (db, user, _) = seeded().await;
    let res = db.append(user, 999, Role::User, "orphan", TurnTiming::default()).await;
    assert!(matches!(res, Err(TutorError::Persistence(_))));
  }
}
