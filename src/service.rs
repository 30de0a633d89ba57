//! HTTP 边界（axum）
//!
//! POST /chat {session_id?, user_input} → 200 返回完整 SessionState；
//! 失败 500 {"error": ...}，对外只给通用文案，连接串 / 上游细节只进日志。
//! GET /health_check → {"status": "ok"}。

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{Orchestrator, SessionState};

/// 共享应用状态
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// /chat 请求体
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub user_input: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health_check", get(health_check))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<SessionState>, (StatusCode, Json<Value>)> {
    // 未带 session_id 视为新会话
    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match state.orchestrator.run_turn(&session_id, &req.user_input).await {
        Ok(session) => Ok(Json(session)),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "chat request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "agent turn failed"})),
            ))
        }
    }
}

/// 绑定地址并运行服务
pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmClient, ScriptedLlm};
    use crate::memory::{ChatMessage, MemorySessionStore, SessionStore};
    use crate::tools::ToolRegistry;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app_with_llm(llm: Arc<dyn LlmClient>) -> Router {
        let orchestrator = Arc::new(Orchestrator::new(
            llm,
            Arc::new(ToolRegistry::new()),
            Arc::new(MemorySessionStore::default()),
            20,
        ));
        router(Arc::new(AppState { orchestrator }))
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let app = app_with_llm(Arc::new(ScriptedLlm::new(vec![])));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health_check")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn chat_returns_full_session_state() {
        let app = app_with_llm(Arc::new(ScriptedLlm::new(vec![ChatMessage::assistant(
            "hello",
        )])));
        let response = app
            .oneshot(chat_request(json!({"session_id": "s1", "user_input": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let state: SessionState = serde_json::from_slice(&body).unwrap();
        assert_eq!(state.session_id, "s1");
        assert_eq!(state.response, "hello");
        assert_eq!(state.conversation_history.len(), 2);
    }

    #[tokio::test]
    async fn missing_session_id_gets_a_fresh_one() {
        let app = app_with_llm(Arc::new(ScriptedLlm::new(vec![ChatMessage::assistant(
            "hello",
        )])));
        let response = app
            .oneshot(chat_request(json!({"user_input": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let state: SessionState = serde_json::from_slice(&body).unwrap();
        assert!(!state.session_id.is_empty());
    }

    #[tokio::test]
    async fn failure_maps_to_generic_500() {
        // 脚本耗尽 → LlmUnavailable("script exhausted")，对外不可见
        let app = app_with_llm(Arc::new(ScriptedLlm::new(vec![])));
        let response = app
            .oneshot(chat_request(json!({"session_id": "s1", "user_input": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"error": "agent turn failed"}));
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn failed_turn_persists_nothing() {
        let store = Arc::new(MemorySessionStore::default());
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(ScriptedLlm::new(vec![])),
            Arc::new(ToolRegistry::new()),
            store.clone(),
            20,
        ));
        let app = router(Arc::new(AppState { orchestrator }));

        let response = app
            .oneshot(chat_request(json!({"session_id": "s1", "user_input": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let loaded = store.load("s1").await.unwrap();
        assert!(loaded.conversation_history.is_empty());
    }
}
