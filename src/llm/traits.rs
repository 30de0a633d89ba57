//! LLM 决策客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：decide 接收完整消息历史与工具声明，
//! 返回一条 assistant 消息，要么直接回答，要么携带 tool_calls 请求执行工具。

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::memory::ChatMessage;

/// 暴露给 LLM 的工具声明
#[derive(Clone, Debug)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// 参数 JSON Schema
    pub parameters: Value,
}

/// LLM 决策客户端
///
/// LLM 是外部非确定性预言机：同样的输入不保证同样的输出，调用方只能假设活性。
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 一次决策：输入消息最旧在前，首条为 system 指令
    async fn decide(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatMessage, AgentError>;
}
