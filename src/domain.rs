//! Domain models: difficulty tiers, conversation turns, and the three response
//! shapes the model is asked to produce.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TutorError;

/// Five ordered difficulty tiers, easiest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
  SuperEasy,
  Easy,
  Medium,
  Hard,
  SuperHard,
}

impl Level {
  pub const ALL: [Level; 5] = [
    Level::SuperEasy,
    Level::Easy,
    Level::Medium,
    Level::Hard,
    Level::SuperHard,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Level::SuperEasy => "super-easy",
      Level::Easy => "easy",
      Level::Medium => "medium",
      Level::Hard => "hard",
      Level::SuperHard => "super-hard",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Level {
  type Err = TutorError;

  /// Accepts `super-easy`, `Super Easy`, `super_easy`, ...
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let norm: String = s
      .trim()
      .chars()
      .map(|c| if c == '_' || c == ' ' { '-' } else { c.to_ascii_lowercase() })
      .collect();
    Level::ALL
      .into_iter()
      .find(|l| l.as_str() == norm)
      .ok_or_else(|| TutorError::validation(format!("unknown level: {s:?}")))
  }
}

impl<'de> Deserialize<'de> for Level {
  fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Assistant => "assistant",
    }
  }
}

impl FromStr for Role {
  type Err = TutorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Role::User),
      "assistant" => Ok(Role::Assistant),
      other => Err(TutorError::Persistence(format!("unknown role in transcript: {other}"))),
    }
  }
}

/// Optional timing attached to a user's chat turn, both in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTiming {
  pub time_remaining: Option<i64>,
  pub time_spent: Option<i64>,
}

/// One message of a task's transcript as fed back into the prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
  pub role: Role,
  pub content: String,
}

/// Generated exercise. `task` is meant to stay under ~150 words; not enforced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
  pub task: String,
  pub time_estimation_minutes: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
  pub message: String,
}

/// Assessment of a submitted solution. `mark` is on the 1.0 (best) to 6.0 scale
/// by convention only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
  pub rating: String,
  pub mark: f64,
  pub time_comparison: String,
  pub solution: String,
}
