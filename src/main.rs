//! Wren 服务入口
//!
//! 加载配置 → 初始化 tracing → 装配协作方（LLM / 嵌入 / 向量索引 / 会话存储，
//! 进程内各一份，构造后以句柄注入编排器）→ 启动 HTTP 服务。

use std::sync::Arc;

use wren::config::{load_config, AppConfig};
use wren::core::Orchestrator;
use wren::llm::{LlmClient, MockLlmClient, OpenAiEmbedder, OpenAiLlm};
use wren::memory::create_session_store;
use wren::retrieval::{MilvusIndex, Retriever};
use wren::service::{serve, AppState};
use wren::tools::{RetrieveContextTool, ToolRegistry};

/// 根据环境变量选择 LLM 后端：有 OPENAI_API_KEY 走 OpenAI 兼容端点，否则 Mock
fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
            Arc::new(OpenAiLlm::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                Some(key.as_str()),
                cfg.llm.temperature,
                cfg.llm.request_timeout_secs,
            ))
        }
        _ => {
            tracing::warn!("OPENAI_API_KEY not set, using Mock LLM");
            Arc::new(MockLlmClient)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wren::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let llm = create_llm_from_config(&cfg);
    let embedder = Arc::new(OpenAiEmbedder::new(
        cfg.embedding.base_url.as_deref(),
        &cfg.embedding.model,
        None,
    ));
    let index = Arc::new(MilvusIndex::new(
        &cfg.milvus.uri,
        &cfg.milvus.token,
        &cfg.milvus.collection_name,
        cfg.milvus.timeout_secs,
    ));
    let retriever = Arc::new(Retriever::new(embedder, index, cfg.retrieval.top_k));

    let mut tools = ToolRegistry::new();
    tools.register(RetrieveContextTool::new(retriever));

    let store = create_session_store(&cfg.postgres);
    let orchestrator = Arc::new(Orchestrator::new(
        llm,
        Arc::new(tools),
        store,
        cfg.app.max_tool_hops,
    ));

    let state = Arc::new(AppState { orchestrator });
    serve(state, &cfg.server.bind).await
}
