//! Recovers the JSON object embedded in free-form model output.
//!
//! Models wrap their answer in code fences, add prose around it, or escape
//! characters that JSON does not allow to be escaped (`\(`, `\_`, `\q` ...).
//! This is a best-effort text cleanup, not a parser: it assumes the structured
//! object is the only top-level `{...}` span in the response.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::TutorError;

/// A backslash and the character it escapes. Matching pairs (rather than a
/// lone backslash) keeps `\\q` intact: the first pair consumes both backslashes.
static ESCAPE_PAIR: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)\\(.)").expect("invalid escape regex"));

/// Characters JSON accepts after a backslash.
const VALID_ESCAPES: &str = "\"\\/bfnrtu";

/// First `{` through the last `}`, across newlines.
static OBJECT_SPAN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("invalid object span regex"));

const FENCE_JSON: &str = "```json";
const FENCE: &str = "```";

/// Steps, in order: trim, strip fences everywhere, drop invalid escape
/// backslashes, return the greedy `{...}` span.
///
/// Fence stripping is textual, so fences inside string values are removed too.
pub fn extract_json(raw: &str) -> Result<String, TutorError> {
  let trimmed = raw.trim();
  let unfenced = trimmed.replace(FENCE_JSON, "").replace(FENCE, "");
  let repaired = repair_escapes(&unfenced);

  match OBJECT_SPAN.find(&repaired) {
    Some(m) => Ok(m.as_str().to_string()),
    None => Err(TutorError::NoJsonFound { raw: trimmed.to_string() }),
  }
}

/// Drop the backslash of every escape JSON would reject, keep the character.
fn repair_escapes(text: &str) -> std::borrow::Cow<'_, str> {
  ESCAPE_PAIR.replace_all(text, |caps: &Captures| {
    let escaped = &caps[1];
    if VALID_ESCAPES.contains(escaped) {
      caps[0].to_string()
    } else {
      escaped.to_string()
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_object_is_returned_unchanged() {
    let body = r#"{"message": "A loop repeats code."}"#;
    assert_eq!(extract_json(body).unwrap(), body);
    assert_eq!(extract_json(&format!("\n  {body}\t\n")).unwrap(), body);
  }

  #[test]
  fn strips_tagged_and_bare_fences() {
    let raw = "```json\n{\"message\":\"hi\"}\n```";
    assert_eq!(extract_json(raw).unwrap(), "{\"message\":\"hi\"}");

    let raw = "```\n{\"message\":\"hi\"}\n```";
    assert_eq!(extract_json(raw).unwrap(), "{\"message\":\"hi\"}");
  }

  #[test]
  fn drops_surrounding_prose() {
    let raw = "Sure! Here is your task:\n{\n  \"task\": \"Sort a list\",\n  \"time_estimation_minutes\": 15\n}\nGood luck.";
    assert_eq!(
      extract_json(raw).unwrap(),
      "{\n  \"task\": \"Sort a list\",\n  \"time_estimation_minutes\": 15\n}"
    );
  }

  #[test]
  fn repairs_invalid_escapes_only() {
    let raw = r#"{"message": "use \q here"}"#;
    assert_eq!(extract_json(raw).unwrap(), r#"{"message": "use q here"}"#);

    let valid = r#"{"message": "use \\q here\n\t\"x\" ä a\/b \u00e4"}"#;
    assert_eq!(extract_json(valid).unwrap(), valid);
  }

  #[test]
  fn repairs_escapes_inside_code_snippets() {
    let raw = r#"{"solution": "re.sub(r'\d+', '', s) \\\_"}"#;
    let out = extract_json(raw).unwrap();
    assert_eq!(out, r#"{"solution": "re.sub(r'd+', '', s) \\_"}"#);
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["solution"], "re.sub(r'd+', '', s) \\_");
  }

  #[test]
  fn greedy_span_keeps_nested_braces() {
    let raw = r#"{"solution": "fn main() { println!(\"{}\", 1); }"}"#;
    assert_eq!(extract_json(raw).unwrap(), raw);
  }

  #[test]
  fn prose_without_braces_is_no_json() {
    let err = extract_json("  Sorry, I cannot help with that.  ").unwrap_err();
    match err {
      TutorError::NoJsonFound { raw } => assert_eq!(raw, "Sorry, I cannot help with that."),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn lone_brace_is_no_json() {
    assert!(matches!(extract_json("{ unterminated"), Err(TutorError::NoJsonFound { .. })));
  }
}
