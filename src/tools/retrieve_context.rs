//! retrieve_context 工具：把检索器暴露给 LLM 决策循环
//!
//! 结果固定为 {"retrieved_contexts": [string]} 的 JSON 串；
//! 命中的分数与页码元数据不进入 LLM 可见结果，只保留原文片段。

use std::sync::Arc;

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::retrieval::Retriever;
use crate::tools::{Tool, ToolError};

/// retrieve_context 入参
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RetrieveContextInput {
    /// 待检索的问题
    pub question: String,
}

/// 把 Retriever 包装为 LLM 可调用的工具
pub struct RetrieveContextTool {
    retriever: Arc<Retriever>,
}

impl RetrieveContextTool {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for RetrieveContextTool {
    fn name(&self) -> &str {
        "retrieve_context"
    }

    fn description(&self) -> &str {
        "Retrieve relevant context passages for a question from the document knowledge base."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schema_for!(RetrieveContextInput)).unwrap_or_default()
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let input: RetrieveContextInput =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let hits = self
            .retriever
            .retrieve(&input.question)
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        tracing::info!(question = %input.question, hits = hits.len(), "retrieve_context");

        let contexts: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
        serde_json::to_string(&json!({ "retrieved_contexts": contexts }))
            .map_err(|e| ToolError::Failed(e.to_string()))
    }
}
