//! 向量索引客户端
//!
//! 通过 Milvus RESTful v2 接口按向量检索；命中按相关度降序返回，
//! 同分按返回顺序保持稳定。上游不可达或返回错误码一律映射为 UpstreamUnavailable。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::core::AgentError;

/// 一条检索命中：文本内容、来源页码、相似度分数
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub page_number: i64,
    pub score: f32,
}

/// 向量索引抽象：search(vector, limit)；零命中返回空序列而非错误
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>, AgentError>;
}

/// Milvus 客户端（RESTful v2）
pub struct MilvusIndex {
    http: reqwest::Client,
    uri: String,
    token: String,
    collection: String,
}

#[derive(Deserialize)]
struct MilvusSearchResponse {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<MilvusSearchRow>,
}

/// 搜索结果行；outputFields 的字段与 distance 平铺在同一层
#[derive(Deserialize)]
struct MilvusSearchRow {
    #[serde(default)]
    text_content: String,
    #[serde(default)]
    page_number: i64,
    #[serde(default)]
    distance: f32,
}

impl MilvusIndex {
    pub fn new(uri: &str, token: &str, collection: &str, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            uri: uri.trim_end_matches('/').to_string(),
            token: token.to_string(),
            collection: collection.to_string(),
        }
    }
}

#[async_trait]
impl VectorIndex for MilvusIndex {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>, AgentError> {
        let url = format!("{}/v2/vectordb/entities/search", self.uri);
        let body = json!({
            "collectionName": self.collection,
            "data": [vector],
            "annsField": "vector",
            "limit": limit,
            "outputFields": ["text_content", "page_number"],
        });

        let mut request = self.http.post(&url).json(&body);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::UpstreamUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AgentError::UpstreamUnavailable(format!(
                "vector search HTTP {}",
                response.status()
            )));
        }

        let parsed: MilvusSearchResponse = response
            .json()
            .await
            .map_err(|e| AgentError::UpstreamUnavailable(format!("invalid search response: {}", e)))?;
        if parsed.code != 0 {
            return Err(AgentError::UpstreamUnavailable(format!(
                "vector search code {}: {}",
                parsed.code,
                parsed.message.unwrap_or_default()
            )));
        }

        Ok(parsed
            .data
            .into_iter()
            .map(|row| SearchHit {
                content: row.text_content,
                page_number: row.page_number,
                score: row.distance,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_rows_keep_order() {
        let raw = r#"{
            "code": 0,
            "data": [
                {"text_content": "A", "page_number": 1, "distance": 0.92},
                {"text_content": "B", "page_number": 4, "distance": 0.87}
            ]
        }"#;
        let parsed: MilvusSearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.code, 0);
        assert_eq!(parsed.data[0].text_content, "A");
        assert_eq!(parsed.data[1].page_number, 4);
        assert!(parsed.data[0].distance > parsed.data[1].distance);
    }

    #[test]
    fn error_response_parses_code_and_message() {
        let raw = r#"{"code": 1100, "message": "collection not found"}"#;
        let parsed: MilvusSearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.code, 1100);
        assert_eq!(parsed.message.as_deref(), Some("collection not found"));
        assert!(parsed.data.is_empty());
    }
}
