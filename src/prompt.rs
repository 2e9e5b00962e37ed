//! Prompt builder: renders one of the three instruction templates from the
//! structured request fields. Pure formatting, no I/O.
//!
//! Context values are embedded as JSON string literals, and the chat transcript
//! as a JSON array of `{role, content}` objects, so quotes and newlines coming
//! from students never break the surrounding instruction text.

use serde_json::{json, Value};

use crate::config::Prompts;
use crate::domain::{ConversationTurn, Level};
use crate::util::fill_template;

/// Which response shape a prompt asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateKind {
  TaskGeneration,
  ChatTurn,
  Evaluation,
}

impl TemplateKind {
  /// Field names the model is told to return for this shape.
  pub fn required_fields(&self) -> &'static [&'static str] {
    match self {
      TemplateKind::TaskGeneration => &["task", "time_estimation_minutes"],
      TemplateKind::ChatTurn => &["message"],
      TemplateKind::Evaluation => &["rating", "mark", "time_comparison", "solution"],
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      TemplateKind::TaskGeneration => "task_generation",
      TemplateKind::ChatTurn => "chat_turn",
      TemplateKind::Evaluation => "evaluation",
    }
  }
}

#[derive(Clone, Debug)]
pub struct TaskPromptContext {
  pub language: String,
  pub level: Level,
  pub comment: String,
}

#[derive(Clone, Debug)]
pub struct ChatPromptContext {
  pub message: String,
  pub level: Level,
  pub language: String,
  pub task: String,
  /// Oldest first.
  pub history: Vec<ConversationTurn>,
}

#[derive(Clone, Debug)]
pub struct EvaluationPromptContext {
  pub task: String,
  pub code: String,
  pub level: Level,
  pub language: String,
  pub ai_usage: bool,
  pub time_estimation: i64,
  pub time_spent: i64,
}

#[derive(Clone, Debug)]
pub enum PromptContext {
  Task(TaskPromptContext),
  Chat(ChatPromptContext),
  Evaluation(EvaluationPromptContext),
}

impl PromptContext {
  pub fn kind(&self) -> TemplateKind {
    match self {
      PromptContext::Task(_) => TemplateKind::TaskGeneration,
      PromptContext::Chat(_) => TemplateKind::ChatTurn,
      PromptContext::Evaluation(_) => TemplateKind::Evaluation,
    }
  }
}

/// Render the prompt for `ctx` using the configured templates.
pub fn build_prompt(prompts: &Prompts, ctx: &PromptContext) -> String {
  match ctx {
    PromptContext::Task(c) => {
      let language = quoted(&c.language);
      let level = quoted(c.level.as_str());
      let comment = quoted(&c.comment);
      fill_template(
        &prompts.task_template,
        &[("language", &language), ("level", &level), ("comment", &comment)],
      )
    }
    PromptContext::Chat(c) => {
      let message = quoted(&c.message);
      let level = quoted(c.level.as_str());
      let language = quoted(&c.language);
      let task = quoted(&c.task);
      let history = transcript_json(&c.history);
      fill_template(
        &prompts.chat_template,
        &[
          ("message", &message),
          ("level", &level),
          ("language", &language),
          ("task", &task),
          ("history", &history),
        ],
      )
    }
    PromptContext::Evaluation(c) => {
      let task = quoted(&c.task);
      let code = quoted(&c.code);
      let level = quoted(c.level.as_str());
      let language = quoted(&c.language);
      let ai_usage = quoted(if c.ai_usage { "yes" } else { "no" });
      let time_estimation = c.time_estimation.to_string();
      let time_spent = c.time_spent.to_string();
      fill_template(
        &prompts.evaluation_template,
        &[
          ("task", &task),
          ("code", &code),
          ("level", &level),
          ("language", &language),
          ("ai_usage", &ai_usage),
          ("time_estimation", &time_estimation),
          ("time_spent", &time_spent),
        ],
      )
    }
  }
}

/// JSON string literal for `s`, quotes included.
fn quoted(s: &str) -> String {
  Value::String(s.to_owned()).to_string()
}

/// Compact JSON array of `{role, content}` objects.
pub fn transcript_json(history: &[ConversationTurn]) -> String {
  let turns: Vec<Value> = history
    .iter()
    .map(|t| json!({ "role": t.role.as_str(), "content": t.content }))
    .collect();
  Value::Array(turns).to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::OFF_TOPIC_REFUSAL;
  use crate::domain::Role;

  fn chat_ctx(history: Vec<ConversationTurn>) -> PromptContext {
    PromptContext::Chat(ChatPromptContext {
      message: "What is a loop?".into(),
      level: Level::Easy,
      language: "python".into(),
      task: "Print numbers 1 to 10".into(),
      history,
    })
  }

  #[test]
  fn every_template_names_its_required_fields() {
    let prompts = Prompts::default();
    let contexts = [
      PromptContext::Task(TaskPromptContext {
        language: "rust".into(),
        level: Level::Medium,
        comment: String::new(),
      }),
      chat_ctx(vec![]),
      PromptContext::Evaluation(EvaluationPromptContext {
        task: "Sum a list".into(),
        code: "print(sum([1, 2]))".into(),
        level: Level::SuperEasy,
        language: "python".into(),
        ai_usage: false,
        time_estimation: 600,
        time_spent: 420,
      }),
    ];
    for ctx in &contexts {
      let out = build_prompt(&prompts, ctx);
      for field in ctx.kind().required_fields() {
        assert!(out.contains(&format!("\"{field}\"")), "{field} missing for {:?}", ctx.kind());
      }
    }
  }

  #[test]
  fn chat_prompt_carries_policy_and_context() {
    let out = build_prompt(&Prompts::default(), &chat_ctx(vec![]));
    assert!(out.contains(OFF_TOPIC_REFUSAL));
    assert!(out.contains("- Message: \"What is a loop?\";"));
    assert!(out.contains("- Difficulty level: \"easy\";"));
    assert!(out.contains("(oldest first): []"));
  }

  #[test]
  fn transcript_strings_are_escaped() {
    let history = vec![
      ConversationTurn { role: Role::User, content: "line one\nsays \"hi\"".into() },
      ConversationTurn { role: Role::Assistant, content: "tab\there".into() },
    ];
    let json = transcript_json(&history);
    assert!(!json.contains('\n'));
    assert!(!json.contains('\t'));
    let parsed: Vec<ConversationTurn> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, history);

    let out = build_prompt(&Prompts::default(), &chat_ctx(history));
    assert!(out.contains(&json));
  }

  #[test]
  fn rendering_is_deterministic() {
    let prompts = Prompts::default();
    let ctx = chat_ctx(vec![ConversationTurn { role: Role::User, content: "x".into() }]);
    assert_eq!(build_prompt(&prompts, &ctx), build_prompt(&prompts, &ctx));
  }

  #[test]
  fn evaluation_prompt_reports_ai_usage_and_times() {
    let out = build_prompt(
      &Prompts::default(),
      &PromptContext::Evaluation(EvaluationPromptContext {
        task: "t".into(),
        code: "fn main() {\n}".into(),
        level: Level::Hard,
        language: "rust".into(),
        ai_usage: true,
        time_estimation: 900,
        time_spent: 1200,
      }),
    );
    assert!(out.contains("- AI usage: \"yes\";"));
    assert!(out.contains("- Submitted code: \"fn main() {\\n}\";"));
    assert!(out.contains("- Estimated time: 900 seconds;"));
    assert!(out.contains("- Actual time spent: 1200 seconds"));
  }
}
