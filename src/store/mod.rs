//! Relational store (SQLite via sqlx).
//!
//! `Database` owns the connection pool. It is created once in `main` and shared
//! through `AppState`; nothing here is global. Submodules add the accessors per
//! table group.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, instrument};

use crate::domain::{ConversationTurn, Role, TurnTiming};
use crate::error::TutorError;

pub mod interactions;
pub mod stats;
pub mod tasks;
pub mod users;

pub use interactions::InteractionRecord;
pub use stats::{FullStats, GeneralStats, LanguageStats};
pub use tasks::{NewSolution, NewTask, TaskDetail, TaskSummary};
pub use users::UserRecord;

/// Window of transcript turns fed back into chat prompts.
pub const TRANSCRIPT_WINDOW: u32 = 10;

/// Persists a task's chat transcript and hands back its recent window.
#[async_trait]
pub trait ConversationStore: Send + Sync {
  /// Append one turn. Returns the new row id.
  async fn append(
    &self,
    user_id: i64,
    task_id: i64,
    role: Role,
    content: &str,
    timing: TurnTiming,
  ) -> Result<i64, TutorError>;

  /// The latest `limit` turns of a task, oldest first. Empty for a new conversation.
  async fn recent_turns(&self, task_id: i64, limit: u32) -> Result<Vec<ConversationTurn>, TutorError>;
}

#[derive(Clone, Debug)]
pub struct Database {
  pool: SqlitePool,
}

impl Database {
  /// Open (or create) the database file and make sure the schema exists.
  #[instrument(level = "info")]
  pub async fn connect(path: &str) -> Result<Self, TutorError> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true)
      .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
      .max_connections(8)
      .connect_with(options)
      .await?;
    let db = Self { pool };
    db.initialize_schema().await?;
    info!(target: "tutor_store", %path, "Database connected and schema initialized");
    Ok(db)
  }

  /// Private in-memory database on a single connection. Used by tests.
  pub async fn in_memory() -> Result<Self, TutorError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect_with(options)
      .await?;
    let db = Self { pool };
    db.initialize_schema().await?;
    Ok(db)
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  async fn initialize_schema(&self) -> Result<(), TutorError> {
    let statements = [
      r#"
      CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT
      )
      "#,
      r#"
      CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        description TEXT NOT NULL,
        language TEXT,
        level TEXT,
        time_estimated INTEGER,
        FOREIGN KEY (user_id) REFERENCES users(id)
      )
      "#,
      r#"
      CREATE TABLE IF NOT EXISTS solutions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        task_id INTEGER,
        code TEXT,
        rating TEXT,
        mark REAL,
        ai_usage INTEGER,
        chat TEXT,
        time_spent INTEGER,
        FOREIGN KEY (task_id) REFERENCES tasks(id)
      )
      "#,
      r#"
      CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT
      )
      "#,
      r#"
      CREATE TABLE IF NOT EXISTS interactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        task_id INTEGER NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        time_remaining INTEGER,
        time_spent INTEGER,
        category_id INTEGER,
        FOREIGN KEY (user_id) REFERENCES users(id),
        FOREIGN KEY (task_id) REFERENCES tasks(id),
        FOREIGN KEY (category_id) REFERENCES categories(id)
      )
      "#,
      "CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id)",
      "CREATE INDEX IF NOT EXISTS idx_solutions_task ON solutions(task_id)",
      "CREATE INDEX IF NOT EXISTS idx_interactions_task ON interactions(task_id)",
    ];
    for sql in statements {
      sqlx::query(sql).execute(&self.pool).await?;
    }
    Ok(())
  }

  /// Remove a user and everything they own in one transaction.
  /// Any failure rolls back the whole set.
  #[instrument(level = "info", skip(self))]
  pub async fn delete_account(&self, user_id: i64) -> Result<(), TutorError> {
    let mut tx = self.pool.begin().await?;

    sqlx::query("DELETE FROM interactions WHERE task_id IN (SELECT id FROM tasks WHERE user_id = ?)")
      .bind(user_id)
      .execute(&mut *tx)
      .await?;
    // Turns written by this user on tasks they do not own.
    sqlx::query("DELETE FROM interactions WHERE user_id = ?")
      .bind(user_id)
      .execute(&mut *tx)
      .await?;
    sqlx::query("DELETE FROM solutions WHERE task_id IN (SELECT id FROM tasks WHERE user_id = ?)")
      .bind(user_id)
      .execute(&mut *tx)
      .await?;
    sqlx::query("DELETE FROM tasks WHERE user_id = ?")
      .bind(user_id)
      .execute(&mut *tx)
      .await?;
    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
      .bind(user_id)
      .execute(&mut *tx)
      .await?
      .rows_affected();

    if deleted == 0 {
      tx.rollback().await?;
      return Err(TutorError::not_found(format!("user {user_id} not found")));
    }

    tx.commit().await?;
    info!(target: "tutor_store", user_id, "Account deleted");
    Ok(())
  }
}
