pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/catalog", get(handlers::handle_catalog))
        // Interview sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete),
        )
        .route("/api/v1/sessions/:id/start", post(handlers::handle_start))
        .route("/api/v1/sessions/:id/answers", post(handlers::handle_answer))
        .route("/api/v1/sessions/:id/end", post(handlers::handle_end))
        .route(
            "/api/v1/sessions/:id/feedback",
            get(handlers::handle_feedback),
        )
        .route("/api/v1/sessions/:id/export", get(handlers::handle_export))
        .route("/api/v1/sessions/:id/reset", post(handlers::handle_reset))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::interview::store::SessionStore;
    use crate::llm_client::testing::{ScriptedConnector, ScriptedInference};
    use crate::llm_client::{LlmError, DEFAULT_BASE_URL, DEFAULT_MODEL};

    fn app(llm: Arc<ScriptedInference>, default_key: Option<&str>) -> Router {
        build_router(AppState {
            sessions: SessionStore::new(),
            connector: Arc::new(ScriptedConnector(llm)),
            config: Config {
                port: 0,
                rust_log: "info".to_string(),
                gemini_api_key: default_key.map(str::to_string),
                gemini_base_url: DEFAULT_BASE_URL.to_string(),
                gemini_model: DEFAULT_MODEL.to_string(),
                llm_timeout_secs: 5,
                session_idle_ttl_secs: 3600,
            },
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes, _) = call_raw(app, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn call_raw(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec(), headers)
    }

    async fn started_session(app: &Router) -> String {
        let (status, created) =
            call(app, "POST", "/api/v1/sessions", Some(json!({"api_key": "k"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, view) = call(
            app,
            "POST",
            &format!("/api/v1/sessions/{id}/start"),
            Some(json!({
                "role": "Software Engineer",
                "experience_level": "Entry Level (0-2 years)"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["phase"], "active");
        id
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(ScriptedInference::new()), None);
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_catalog() {
        let app = app(Arc::new(ScriptedInference::new()), None);
        let (status, body) = call(&app, "GET", "/api/v1/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_create_without_any_key_is_blocked() {
        let app = app(Arc::new(ScriptedInference::new()), None);
        let (status, body) = call(&app, "POST", "/api/v1/sessions", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_API_KEY");
    }

    #[tokio::test]
    async fn test_create_uses_default_key_without_body() {
        let app = app(Arc::new(ScriptedInference::new()), Some("server-key"));
        let (status, body) = call(&app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["phase"], "setup");
        assert_eq!(body["question_count"], 0);
    }

    #[tokio::test]
    async fn test_create_with_malformed_body_is_rejected() {
        let app = app(Arc::new(ScriptedInference::new()), Some("server-key"));
        for body in [json!({"api_key": 5}), json!(["k"])] {
            let (status, body) = call(&app, "POST", "/api/v1/sessions", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_start_hides_persona_from_view() {
        let app = app(Arc::new(ScriptedInference::new()), None);
        let id = started_session(&app).await;
        let (_, view) = call(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        let conversation = view["conversation"].as_array().unwrap();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0]["speaker"], "assistant");
        assert_eq!(view["question_count"], 1);
    }

    #[tokio::test]
    async fn test_start_with_blank_role_is_rejected() {
        let app = app(Arc::new(ScriptedInference::new()), Some("k"));
        let (_, created) = call(&app, "POST", "/api/v1/sessions", None).await;
        let id = created["id"].as_str().unwrap();
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/start"),
            Some(json!({"role": " ", "experience_level": "Mid Level (3-5 years)"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_full_interview_flow() {
        let llm = Arc::new(
            ScriptedInference::new()
                .reply("What project are you proudest of?")
                .reply("**OVERALL PERFORMANCE: 8/10**"),
        );
        let app = app(llm.clone(), None);
        let id = started_session(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/answers"),
            Some(json!({"answer": "I build compilers."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], true);
        assert_eq!(body["session"]["question_count"], 2);
        assert_eq!(body["session"]["conversation"].as_array().unwrap().len(), 3);

        let (status, body) = call(&app, "POST", &format!("/api/v1/sessions/{id}/end"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"]["text"], "**OVERALL PERFORMANCE: 8/10**");
        assert_eq!(body["session"]["phase"], "ended");
        let file_name = body["export_file_name"].as_str().unwrap().to_string();

        // Re-fetching feedback is served from the cache.
        let (status, _) = call(&app, "GET", &format!("/api/v1/sessions/{id}/feedback"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(llm.generate_count(), 1);

        let (status, bytes, headers) =
            call_raw(&app, "GET", &format!("/api/v1/sessions/{id}/export"), None).await;
        assert_eq!(status, StatusCode::OK);
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert_eq!(disposition, format!("attachment; filename=\"{file_name}\""));
        let record: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record["role"], "Software Engineer");
        assert_eq!(record["conversation"].as_array().unwrap().len(), 3);

        // Answers after the end are refused.
        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/answers"),
            Some(json!({"answer": "one more thing"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_blank_answer_not_accepted() {
        let llm = Arc::new(ScriptedInference::new());
        let app = app(llm.clone(), None);
        let id = started_session(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/answers"),
            Some(json!({"answer": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], false);
        assert_eq!(llm.chat_count(), 0);
    }

    #[tokio::test]
    async fn test_quota_error_surfaces_as_429_and_rolls_back() {
        let llm = Arc::new(ScriptedInference::new().fail(LlmError::Api {
            status: 429,
            message: "RESOURCE_EXHAUSTED: quota".to_string(),
        }));
        let app = app(llm, None);
        let id = started_session(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/answers"),
            Some(json!({"answer": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "QUOTA_EXCEEDED");

        let (_, view) = call(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["conversation"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_before_feedback_conflicts() {
        let llm = Arc::new(ScriptedInference::new().fail(LlmError::EmptyContent));
        let app = app(llm, None);
        let id = started_session(&app).await;

        let (status, body) = call(&app, "POST", &format!("/api/v1/sessions/{id}/end"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (status, _) = call(&app, "GET", &format!("/api/v1/sessions/{id}/export"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_reset_and_delete() {
        let app = app(Arc::new(ScriptedInference::new()), None);
        let id = started_session(&app).await;

        let (status, view) = call(&app, "POST", &format!("/api/v1/sessions/{id}/reset"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["phase"], "setup");
        assert_eq!(view["question_count"], 0);
        assert!(view["conversation"].as_array().unwrap().is_empty());
        assert!(view["started_at"].is_null());

        let (status, _) = call(&app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
