//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::AgentError;
use crate::llm::{LlmClient, ToolSpec};
use crate::memory::{ChatMessage, Role};

/// Mock 客户端：回显用户最后一条消息，不发起工具调用
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn decide(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ChatMessage, AgentError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(ChatMessage::assistant(format!("Echo from Mock: {}", last_user)))
    }
}

/// 脚本化客户端：按预置顺序逐条返回决策，并记录每次收到的消息历史，供测试断言
pub struct ScriptedLlm {
    decisions: Mutex<VecDeque<ChatMessage>>,
    /// 每次 decide 收到的完整消息历史
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(decisions: Vec<ChatMessage>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn decide(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ChatMessage, AgentError> {
        self.seen.lock().await.push(messages.to_vec());
        self.decisions
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| AgentError::LlmUnavailable("script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_echoes_last_user_message() {
        let llm = MockLlmClient;
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("first"),
            ChatMessage::assistant("a"),
            ChatMessage::user("second"),
        ];
        let reply = llm.decide(&messages, &[]).await.unwrap();
        assert_eq!(reply.content, "Echo from Mock: second");
        assert!(reply.is_terminal());
    }

    #[tokio::test]
    async fn scripted_replays_in_order_then_errors() {
        let llm = ScriptedLlm::new(vec![
            ChatMessage::assistant("one"),
            ChatMessage::assistant("two"),
        ]);
        let messages = [ChatMessage::user("hi")];
        assert_eq!(llm.decide(&messages, &[]).await.unwrap().content, "one");
        assert_eq!(llm.decide(&messages, &[]).await.unwrap().content, "two");
        assert!(matches!(
            llm.decide(&messages, &[]).await,
            Err(AgentError::LlmUnavailable(_))
        ));
        assert_eq!(llm.seen.lock().await.len(), 3);
    }
}
