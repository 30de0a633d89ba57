//! OpenAI 兼容 Chat Completions 客户端
//!
//! 调用任意 OpenAI 兼容端点（可配置 base_url）；请求携带工具声明（tools），
//! 响应取首个 choice 的 content 与 tool_calls。传输失败与非 2xx 一律视为 LLM 不可用，
//! 不在客户端内重试。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::AgentError;
use crate::llm::{LlmClient, ToolSpec};
use crate::memory::{ChatMessage, Role, ToolCallRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI 兼容客户端：持有 HTTP 客户端、端点与 model 名
pub struct OpenAiLlm {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiLlm {
    /// 未显式给 api_key 时回退环境变量 OPENAI_API_KEY
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        api_key: Option<&str>,
        temperature: f32,
        request_timeout_secs: u64,
    ) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: model.to_string(),
            temperature,
        }
    }

    fn wire_messages(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::Tool => json!({
                    "role": "tool",
                    "content": m.content,
                    "tool_call_id": m.tool_call_id,
                }),
                Role::Assistant if !m.tool_calls.is_empty() => json!({
                    "role": "assistant",
                    "content": m.content,
                    "tool_calls": m.tool_calls.iter().map(|tc| json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {"name": tc.name, "arguments": tc.arguments},
                    })).collect::<Vec<_>>(),
                }),
                role => json!({"role": role, "content": m.content}),
            })
            .collect()
    }

    fn wire_tools(tools: &[ToolSpec]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    },
                })
            })
            .collect()
    }
}

/// Chat Completions 响应（只解需要的字段）
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: WireAssistantMessage,
}

#[derive(Deserialize)]
struct WireAssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunctionCall,
}

#[derive(Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

impl WireAssistantMessage {
    fn into_chat_message(self) -> ChatMessage {
        let tool_calls: Vec<ToolCallRequest> = self
            .tool_calls
            .into_iter()
            .map(|tc| ToolCallRequest {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();
        let content = self.content.unwrap_or_default();
        if tool_calls.is_empty() {
            ChatMessage::assistant(content)
        } else {
            ChatMessage::assistant_with_tool_calls(content, tool_calls)
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiLlm {
    async fn decide(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatMessage, AgentError> {
        let mut body = json!({
            "model": self.model,
            "messages": Self::wire_messages(messages),
            "temperature": self.temperature,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(Self::wire_tools(tools));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::LlmUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::LlmUnavailable(format!(
                "HTTP {}: {}",
                status,
                truncate(&detail, 300)
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AgentError::LlmUnavailable(format!("invalid response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.into_chat_message())
            .ok_or_else(|| AgentError::LlmUnavailable("empty choices".to_string()))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
