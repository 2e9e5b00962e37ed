//! User accounts. Passwords arrive here already hashed.

use tracing::{info, instrument};

use super::Database;
use crate::error::TutorError;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserRecord {
  pub id: i64,
  pub username: String,
  pub password: Option<String>,
}

impl Database {
  #[instrument(level = "info", skip(self, password_hash))]
  pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, TutorError> {
    let res = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
      .bind(username)
      .bind(password_hash)
      .execute(self.pool())
      .await
      .map_err(|e| unique_as_validation(e, "username is already taken"))?;
    let id = res.last_insert_rowid();
    info!(target: "tutor_store", user_id = id, "User registered");
    Ok(id)
  }

  pub async fn find_user_by_name(&self, username: &str) -> Result<Option<UserRecord>, TutorError> {
    let user = sqlx::query_as::<_, UserRecord>("SELECT id, username, password FROM users WHERE username = ?")
      .bind(username)
      .fetch_optional(self.pool())
      .await?;
    Ok(user)
  }

  /// Stored hash for a user id; `None` if the user does not exist.
  pub async fn password_hash(&self, user_id: i64) -> Result<Option<String>, TutorError> {
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT password FROM users WHERE id = ?")
      .bind(user_id)
      .fetch_optional(self.pool())
      .await?;
    Ok(row.and_then(|(hash,)| hash))
  }

  #[instrument(level = "info", skip(self))]
  pub async fn update_username(&self, user_id: i64, username: &str) -> Result<(), TutorError> {
    let res = sqlx::query("UPDATE users SET username = ? WHERE id = ?")
      .bind(username)
      .bind(user_id)
      .execute(self.pool())
      .await
      .map_err(|e| unique_as_validation(e, "username is already taken"))?;
    if res.rows_affected() == 0 {
      return Err(TutorError::not_found(format!("user {user_id} not found")));
    }
    Ok(())
  }

  #[instrument(level = "info", skip(self, password_hash))]
  pub async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), TutorError> {
    let res = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
      .bind(password_hash)
      .bind(user_id)
      .execute(self.pool())
      .await?;
    if res.rows_affected() == 0 {
      return Err(TutorError::not_found(format!("user {user_id} not found")));
    }
    Ok(())
  }
}

fn unique_as_validation(err: sqlx::Error, message: &str) -> TutorError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => TutorError::validation(message),
    _ => err.into(),
  }
}
