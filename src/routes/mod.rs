//! Router assembly: `/api/...` endpoints, CORS and HTTP tracing.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/...`
/// - CORS restricted to the configured origins, credentials allowed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_origins);

    let task_routes = Router::new()
        .route("/generate", post(http::http_generate_task))
        .route("/save", post(http::http_save_task))
        .route("/evaluate", post(http::http_evaluate_task));

    let user_routes = Router::new()
        .route("/tasks", get(http::http_user_tasks))
        .route("/task/:task_id", get(http::http_single_task))
        .route("/stats/general", get(http::http_stats_general))
        .route("/stats/full", get(http::http_stats_full))
        .route("/stats/language", get(http::http_stats_language))
        .route("/settings/change-username", post(http::http_change_username))
        .route("/settings/change-password", post(http::http_change_password))
        .route("/settings/delete-account", post(http::http_delete_account));

    let api = Router::new()
        .route("/health", get(http::http_health))
        .route("/register", post(http::http_register))
        .route("/login", post(http::http_login))
        .route("/interact", post(http::http_interact))
        .route("/chat/task-question", post(http::http_task_chat))
        .nest("/task", task_routes)
        .nest("/user", user_routes);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]);

    // A wildcard origin cannot be combined with credentials.
    if origins.iter().any(|o| o == "*") {
        warn!(target: "coding_tutor", "CORS wildcard origin configured; allowing any origin without credentials");
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(target: "coding_tutor", origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::store::Database;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn router_with_origins(origins: &[&str]) -> Router {
        let db = Database::in_memory().await.unwrap();
        let origins = origins.iter().map(|o| o.to_string()).collect();
        build_router(Arc::new(AppState::new(db, None, Prompts::default(), origins)))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/health")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn wildcard_origin_allows_any_without_credentials() {
        let app = router_with_origins(&["*"]).await;
        let res = app.oneshot(preflight("https://anywhere.example")).await.unwrap();
        let headers = res.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[tokio::test]
    async fn listed_origin_is_echoed_with_credentials() {
        let app = router_with_origins(&["http://localhost:5173"]).await;
        let res = app.oneshot(preflight("http://localhost:5173")).await.unwrap();
        let headers = res.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
    }

    #[tokio::test]
    async fn unlisted_origin_gets_no_allow_header() {
        let app = router_with_origins(&["http://localhost:5173"]).await;
        let res = app.oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
