#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use coding_tutor_backend::{
    build_router, config::Prompts, error::TutorError, openai::CompletionClient, store::Database,
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Completion client that replays canned replies and records every prompt.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, TutorError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<&str>) -> Arc<Self> {
        let replies = replies.into_iter().map(|r| Ok(r.to_string())).collect();
        Arc::new(Self { replies: Mutex::new(replies), prompts: Mutex::default() })
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, TutorError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TutorError::upstream("no scripted reply left")))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Router over a fresh in-memory database. `client = None` means no completion service.
pub async fn test_app(client: Option<Arc<ScriptedClient>>) -> (Router, Database) {
    let db = Database::in_memory().await.expect("in-memory database");
    let completion = client.map(|c| {
        let c: Arc<dyn CompletionClient> = c;
        c
    });
    let state = AppState::new(
        db.clone(),
        completion,
        Prompts::default(),
        vec!["http://localhost:5173".to_string()],
    );
    (build_router(Arc::new(state)), db)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into()))
    };
    (status, json)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}
