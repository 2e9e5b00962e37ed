//! Decodes extracted JSON into one of the three response shapes.
//!
//! Each shape is parsed into a private wire struct first, then validated and
//! converted, so a caller only ever sees a complete `TaskDraft`, `ChatReply`
//! or `Evaluation`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{ChatReply, Evaluation, TaskDraft};
use crate::error::TutorError;
use crate::extract::extract_json;
use crate::prompt::TemplateKind;

/// A response shape the model can be asked for.
pub trait ModelResponse: Sized {
  const KIND: TemplateKind;

  fn decode(json: &str) -> Result<Self, TutorError>;
}

/// Extract then decode raw completion text.
pub fn parse_completion<T: ModelResponse>(raw: &str) -> Result<T, TutorError> {
  let json = extract_json(raw)?;
  T::decode(&json)
}

fn from_json<T: DeserializeOwned>(json: &str, kind: TemplateKind) -> Result<T, TutorError> {
  serde_json::from_str(json).map_err(|e| TutorError::Decode(format!("{}: {e}", kind.as_str())))
}

#[derive(Deserialize)]
struct TaskDraftWire {
  task: String,
  time_estimation_minutes: u32,
}

impl ModelResponse for TaskDraft {
  const KIND: TemplateKind = TemplateKind::TaskGeneration;

  fn decode(json: &str) -> Result<Self, TutorError> {
    let wire: TaskDraftWire = from_json(json, Self::KIND)?;
    if wire.time_estimation_minutes == 0 {
      return Err(TutorError::Decode("time_estimation_minutes must be greater than 0".into()));
    }
    Ok(TaskDraft { task: wire.task, time_estimation_minutes: wire.time_estimation_minutes })
  }
}

#[derive(Deserialize)]
struct ChatReplyWire {
  message: String,
}

impl ModelResponse for ChatReply {
  const KIND: TemplateKind = TemplateKind::ChatTurn;

  fn decode(json: &str) -> Result<Self, TutorError> {
    let wire: ChatReplyWire = from_json(json, Self::KIND)?;
    Ok(ChatReply { message: wire.message })
  }
}

/// Models write the mark as `"2,3"`, `"2.3"` or a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum MarkWire {
  Number(f64),
  Text(String),
}

#[derive(Deserialize)]
struct EvaluationWire {
  rating: String,
  mark: MarkWire,
  time_comparison: String,
  solution: String,
}

impl ModelResponse for Evaluation {
  const KIND: TemplateKind = TemplateKind::Evaluation;

  fn decode(json: &str) -> Result<Self, TutorError> {
    let wire: EvaluationWire = from_json(json, Self::KIND)?;
    let mark = match wire.mark {
      MarkWire::Number(n) => n,
      MarkWire::Text(s) => normalize_mark(&s)?,
    };
    Ok(Evaluation {
      rating: wire.rating,
      mark,
      time_comparison: wire.time_comparison,
      solution: wire.solution,
    })
  }
}

/// `"2,3"` and `"2.3"` both become 2.3. Range is not checked.
pub fn normalize_mark(raw: &str) -> Result<f64, TutorError> {
  let normalized = raw.trim().replacen(',', ".", 1);
  normalized
    .parse::<f64>()
    .ok()
    .filter(|m| m.is_finite())
    .ok_or_else(|| TutorError::Decode(format!("mark is not a decimal number: {raw:?}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fenced_and_bare_payloads_decode_the_same() {
    let fenced: ChatReply = parse_completion("```json\n{\"message\":\"hi\"}\n```").unwrap();
    let bare: ChatReply = parse_completion("{\"message\":\"hi\"}").unwrap();
    assert_eq!(fenced, bare);
    assert_eq!(fenced, ChatReply { message: "hi".into() });
  }

  #[test]
  fn task_draft_requires_positive_estimate() {
    let ok = TaskDraft::decode(r#"{"task":"Reverse a string","time_estimation_minutes":20}"#).unwrap();
    assert_eq!(ok.time_estimation_minutes, 20);

    let zero = TaskDraft::decode(r#"{"task":"x","time_estimation_minutes":0}"#);
    assert!(matches!(zero, Err(TutorError::Decode(_))));

    let missing = TaskDraft::decode(r#"{"task":"x"}"#);
    assert!(matches!(missing, Err(TutorError::Decode(_))));
  }

  #[test]
  fn mark_accepts_comma_dot_and_numbers() {
    assert_eq!(normalize_mark("2,3").unwrap(), 2.3);
    assert_eq!(normalize_mark("2.3").unwrap(), 2.3);
    assert!(matches!(normalize_mark("abc"), Err(TutorError::Decode(_))));
    assert!(matches!(normalize_mark("NaN"), Err(TutorError::Decode(_))));

    let eval = Evaluation::decode(
      r#"{"rating":"Clean","mark":1.7,"time_comparison":"realistic","solution":"print(1)"}"#,
    )
    .unwrap();
    assert_eq!(eval.mark, 1.7);
  }

  #[test]
  fn evaluation_with_bad_mark_is_rejected_whole() {
    let res = Evaluation::decode(
      r#"{"rating":"ok","mark":"abc","time_comparison":"too slow","solution":"x"}"#,
    );
    assert!(matches!(res, Err(TutorError::Decode(_))));
  }

  #[test]
  fn evaluation_missing_solution_is_rejected() {
    let res = Evaluation::decode(r#"{"rating":"ok","mark":"2,0","time_comparison":"ok"}"#);
    assert!(matches!(res, Err(TutorError::Decode(_))));
  }

  #[test]
  fn invalid_syntax_is_a_decode_error() {
    assert!(matches!(ChatReply::decode("{\"message\": }"), Err(TutorError::Decode(_))));
  }

  #[test]
  fn no_braces_surface_as_no_json() {
    let res: Result<ChatReply, _> = parse_completion("Sorry, I cannot help with that.");
    assert!(matches!(res, Err(TutorError::NoJsonFound { .. })));
  }

  #[test]
  fn extra_fields_are_ignored() {
    let reply = ChatReply::decode(r#"{"message":"m","confidence":0.9}"#).unwrap();
    assert_eq!(reply.message, "m");
  }
}
