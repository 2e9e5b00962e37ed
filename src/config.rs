//! Runtime configuration: server/env settings plus the instruction templates.
//!
//! Environment (a `.env` file is loaded first by `main`):
//!   PORT                 : u16 (default 8080)
//!   DATABASE_PATH        : SQLite file (default /data/tutor.db if /data exists, else tutor.db)
//!   CORS_ALLOWED_ORIGINS : comma separated list of allowed origins
//!   OPENAI_API_KEY       : enables the completion client if present
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_MODEL         : default "gpt-4-turbo"
//!   OPENAI_TIMEOUT_SECS  : default 60
//!   TUTOR_CONFIG_PATH    : optional TOML file with a `[prompts]` table
//!
//! See `Prompts` for the template placeholders.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ORIGINS: &str = "http://localhost:5173,https://coding-tutor-app.vercel.app";
const PERSISTENT_DIR: &str = "/data";

#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub database_path: String,
  pub cors_origins: Vec<String>,
  pub openai: Option<OpenAiConfig>,
  pub prompts: Prompts,
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub timeout_secs: u64,
}

impl AppConfig {
  pub fn from_env() -> Self {
    let mut cfg = Self::from_vars(|key| std::env::var(key).ok());
    if let Some(file) = load_file_config_from_env() {
      cfg.prompts = file.prompts;
    }
    cfg
  }

  /// Build from an arbitrary variable lookup; `from_env` passes `std::env::var`.
  pub fn from_vars<F>(var: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let port = var("PORT")
      .and_then(|p| p.trim().parse::<u16>().ok())
      .unwrap_or(DEFAULT_PORT);

    let database_path = var("DATABASE_PATH").unwrap_or_else(default_database_path);

    let cors_origins = var("CORS_ALLOWED_ORIGINS")
      .unwrap_or_else(|| DEFAULT_ORIGINS.into())
      .split(',')
      .map(|o| o.trim().to_string())
      .filter(|o| !o.is_empty())
      .collect();

    let openai = var("OPENAI_API_KEY")
      .filter(|k| !k.trim().is_empty())
      .map(|api_key| OpenAiConfig {
        api_key,
        base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
        model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4-turbo".into()),
        timeout_secs: var("OPENAI_TIMEOUT_SECS")
          .and_then(|s| s.parse().ok())
          .unwrap_or(60),
      });

    Self {
      port,
      database_path,
      cors_origins,
      openai,
      prompts: Prompts::default(),
    }
  }
}

fn default_database_path() -> String {
  if Path::new(PERSISTENT_DIR).is_dir() {
    info!(target: "coding_tutor", dir = PERSISTENT_DIR, "Using persistent database directory");
    format!("{PERSISTENT_DIR}/tutor.db")
  } else {
    info!(target: "coding_tutor", "Persistent storage not found, using local database");
    "tutor.db".into()
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Instruction templates. Every template is keyed by the response shape it
/// asks for; bump `version` whenever the output-format section changes.
///
/// Placeholders:
///   task_template       : {language} {level} {comment}
///   chat_template       : {message} {level} {language} {task} {history}
///   evaluation_template : {task} {code} {level} {language} {ai_usage}
///                         {time_estimation} {time_spent}
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub version: String,
  pub system: String,
  pub task_template: String,
  pub chat_template: String,
  pub evaluation_template: String,
}

pub const OFF_TOPIC_REFUSAL: &str =
  "This message is not related to the topic. I can only answer questions about the task.";

impl Default for Prompts {
  fn default() -> Self {
    Self {
      version: "tutor.v1".into(),
      system: "You are a helpful coding tutor.".into(),
      task_template: r#"
Goal:
Create a clearly worded programming exercise for students.

Return Format:
- A precise task description (max. 150 words).
- A realistic estimate of the time needed to solve it, in minutes.
- Do not use code fences.
- Exact JSON format (strictly JSON, no illegal characters, no additional text!):
{
  "task": "<task description>",
  "time_estimation_minutes": <estimated time as a number>
}

Warnings:
- Make sure the task can be solved using only the standard library.
- Make sure the task can be solved in a single file.
- Whenever possible, ask for a specific algorithm that fits the difficulty level.
- Give realistic time estimates. The estimate must never be 0!
- There are 5 difficulty levels (super-easy, easy, medium, hard, super-hard). Strictly respect the chosen level!
- Do not include the solution.

Context Dump:
- Programming language: {language};
- Difficulty level: {level};
- Additional notes: {comment}
"#
      .into(),
      chat_template: format!(
        r#"
Goal:
Answer the student's question about the task, matching the difficulty level.

Return Format:
- Exact JSON format (strictly JSON, no illegal characters, no additional text, no code fences!):
{{
  "message": "<answer>"
}}

Warnings:
- Make sure your answer matches the difficulty level of the task.
- Make sure your answer fits the task.
- Do not reveal the solution, unless the student EXPLICITLY asks for it.
- If the message is not about programming, reply with "{OFF_TOPIC_REFUSAL}". Do not be too strict about this!

Context Dump:
- Message: {{message}};
- Difficulty level: {{level}};
- Programming language: {{language}};
- Task: {{task}};
- Conversation so far (oldest first): {{history}}
"#
      ),
      evaluation_template: r#"
Goal:
Evaluate the submitted solution to the following task.

Return Format:
- A short assessment of code quality, readability and efficiency. Take into account whether AI was used.
- A school mark from 1,0 (very good) to 6,0 (insufficient). Steps of 0,1 are allowed.
- A comparison between the estimated and the actual time (realistic, too fast, too slow).
- A generated reference solution.
- Do not use code fences.
- Exact JSON format (strictly JSON, no illegal characters, no additional text!):
{
  "rating": "<assessment>",
  "mark": "<school mark: x,y>",
  "time_comparison": "<comparison of the times>",
  "solution": "<generated solution>"
}

Warnings:
- Give objective and realistic assessments.
- There are 5 difficulty levels (super-easy, easy, medium, hard, super-hard). Strictly respect the chosen level!

Context Dump:
- Task: {task};
- Submitted code: {code};
- Level: {level};
- Language: {language};
- AI usage: {ai_usage};
- Estimated time: {time_estimation} seconds;
- Actual time spent: {time_spent} seconds
"#
      .into(),
    }
  }
}

/// Attempt to load `FileConfig` from TUTOR_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("TUTOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<FileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "coding_tutor", %path, version = %cfg.prompts.version, "Loaded prompt config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "coding_tutor", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "coding_tutor", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
