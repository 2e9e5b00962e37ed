//! Minimal OpenAI client for our use-cases.
//!
//! One chat.completions call per request: the system role, then the rendered
//! prompt as the user message. No retries; failures go straight back to the
//! caller as `TutorError::Upstream`.
//!
//! NOTE: We never log the API key or message contents, only sizes, latency and usage.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::OpenAiConfig;
use crate::error::TutorError;

pub const MAX_TOKENS: u32 = 1000;
/// Low temperature keeps the model on the requested JSON format.
pub const TEMPERATURE: f32 = 0.2;

/// Anything that turns (system, prompt) into completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
  async fn complete(&self, system: &str, prompt: &str) -> Result<String, TutorError>;

  fn model(&self) -> &str;
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  pub fn new(cfg: &OpenAiConfig) -> Result<Self, TutorError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      api_key: cfg.api_key.clone(),
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      model: cfg.model.clone(),
    })
  }
}

#[async_trait]
impl CompletionClient for OpenAI {
  #[instrument(level = "info", skip(self, system, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn complete(&self, system: &str, prompt: &str) -> Result<String, TutorError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: prompt.into() },
      ],
      temperature: TEMPERATURE,
      max_tokens: MAX_TOKENS,
    };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "coding-tutor-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| {
        error!(target: "tutor_ai", error = %e, "Completion request failed");
        TutorError::upstream(e.to_string())
      })?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      error!(target: "tutor_ai", %status, "Completion service returned an error");
      return Err(TutorError::upstream(format!("OpenAI HTTP {status}: {msg}")));
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(target: "tutor_ai", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }

    let text = body
      .choices
      .into_iter()
      .next()
      .ok_or_else(|| TutorError::upstream("completion contained no choices"))?
      .message
      .content
      .unwrap_or_default();

    info!(target: "tutor_ai", elapsed = ?start.elapsed(), response_len = text.len(), "Completion received");
    Ok(text)
  }

  fn model(&self) -> &str {
    &self.model
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  max_tokens: u32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)] choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{http::StatusCode, routing::post, Json, Router};
  use serde_json::{json, Value};
  use std::sync::{Arc, Mutex};

  /// Serve `router` on an ephemeral port and return a client pointed at it.
  async fn client_for(router: Router) -> OpenAI {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    OpenAI::new(&OpenAiConfig {
      api_key: "sk-test".into(),
      base_url: format!("http://{addr}/v1/"),
      model: "gpt-test".into(),
      timeout_secs: 5,
    })
    .unwrap()
  }

  #[tokio::test]
  async fn sends_system_then_prompt_and_returns_first_choice() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let seen_in_handler = seen.clone();
    let router = Router::new().route(
      "/v1/chat/completions",
      post(move |Json(body): Json<Value>| {
        let seen = seen_in_handler.clone();
        async move {
          *seen.lock().unwrap() = Some(body);
          Json(json!({
            "choices": [
              { "message": { "content": "{\"message\":\"first\"}" } },
              { "message": { "content": "second" } }
            ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
          }))
        }
      }),
    );
    let oa = client_for(router).await;

    let text = oa.complete("You are a helpful coding tutor.", "prompt").await.unwrap();
    assert_eq!(text, "{\"message\":\"first\"}");

    let body = seen.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["max_tokens"], 1000);
    assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You are a helpful coding tutor.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "prompt");
  }

  #[tokio::test]
  async fn non_success_status_is_upstream_error() {
    let router = Router::new().route(
      "/v1/chat/completions",
      post(|| async {
        (
          StatusCode::TOO_MANY_REQUESTS,
          Json(json!({ "error": { "message": "Rate limit reached" } })),
        )
      }),
    );
    let oa = client_for(router).await;
    match oa.complete("s", "p").await {
      Err(TutorError::Upstream(msg)) => {
        assert!(msg.contains("429"));
        assert!(msg.contains("Rate limit reached"));
      }
      other => panic!("unexpected result: {other:?}"),
    }
  }

  #[tokio::test]
  async fn empty_choice_list_is_upstream_error() {
    let router = Router::new().route(
      "/v1/chat/completions",
      post(|| async { Json(json!({ "choices": [] })) }),
    );
    let oa = client_for(router).await;
    assert!(matches!(oa.complete("s", "p").await, Err(TutorError::Upstream(_))));
  }

  #[tokio::test]
  async fn unreachable_service_is_upstream_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let oa = OpenAI::new(&OpenAiConfig {
      api_key: "k".into(),
      base_url: format!("http://{addr}/v1"),
      model: "m".into(),
      timeout_secs: 2,
    })
    .unwrap();
    assert!(matches!(oa.complete("s", "p").await, Err(TutorError::Upstream(_))));
  }
}
