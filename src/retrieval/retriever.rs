//! 检索器：查询文本 → 嵌入 → 向量检索
//!
//! 不在内部重试；上游失败原样上抛（重试策略属于更外层）。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::EmbeddingClient;
use crate::retrieval::{SearchHit, VectorIndex};

/// 检索器：封装嵌入 + 相似度检索；top_k 为默认返回条数
pub struct Retriever {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    /// 按默认 top_k 检索
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchHit>, AgentError> {
        self.retrieve_limit(query, self.top_k).await
    }

    /// 指定返回条数检索；空白查询与 top_k = 0 直接返回空结果，不触发上游调用
    pub async fn retrieve_limit(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, AgentError> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query).await?;
        if vector.is_empty() {
            return Ok(Vec::new());
        }
        self.index.search(&vector, top_k).await
    }
}
