//! 编排器：单轮对话的入口
//!
//! load → 状态机跑到终态 → save → 返回最新状态。任何组件失败都包装为
//! OrchestrationFailed 上抛；状态机没有到达 Respond 时跳过 save，不落半成品状态。

use std::sync::Arc;

use crate::core::{AgentError, SessionState};
use crate::llm::LlmClient;
use crate::memory::SessionStore;
use crate::tools::ToolRegistry;
use crate::turn::TurnMachine;

/// 编排器：持有长生命周期协作方句柄（进程启动时装配一次，全程共享）
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    store: Arc<dyn SessionStore>,
    max_tool_hops: usize,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn SessionStore>,
        max_tool_hops: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            store,
            max_tool_hops,
        }
    }

    /// 执行一轮对话并持久化结果
    pub async fn run_turn(
        &self,
        session_id: &str,
        user_input: &str,
    ) -> Result<SessionState, AgentError> {
        tracing::info!(session_id = %session_id, "turn started");
        match self.run_turn_inner(session_id, user_input).await {
            Ok(state) => {
                tracing::info!(
                    session_id = %session_id,
                    history_len = state.conversation_history.len(),
                    "turn completed"
                );
                Ok(state)
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "turn failed");
                Err(e.into_orchestration_failure())
            }
        }
    }

    async fn run_turn_inner(
        &self,
        session_id: &str,
        user_input: &str,
    ) -> Result<SessionState, AgentError> {
        let state = self.store.load(session_id).await?;
        let machine = TurnMachine::new(self.llm.clone(), self.tools.clone(), self.max_tool_hops);
        let state = machine.run(state, user_input).await?;
        self.store.save(&state).await?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;
    use crate::memory::{ChatMessage, MemorySessionStore};

    use async_trait::async_trait;

    /// save 永远失败的存储，load 委托给内存实现
    #[derive(Default)]
    struct SaveFailsStore {
        inner: MemorySessionStore,
    }

    #[async_trait]
    impl SessionStore for SaveFailsStore {
        async fn load(&self, session_id: &str) -> Result<SessionState, AgentError> {
            self.inner.load(session_id).await
        }

        async fn save(&self, _state: &SessionState) -> Result<(), AgentError> {
            Err(AgentError::PersistenceUnavailable(
                "connection refused".to_string(),
            ))
        }
    }

    fn orchestrator_with(
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn SessionStore>,
    ) -> Orchestrator {
        Orchestrator::new(llm, Arc::new(ToolRegistry::new()), store, 20)
    }

    #[tokio::test]
    async fn turn_result_is_persisted() {
        let store = Arc::new(MemorySessionStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![ChatMessage::assistant("hello")]));
        let orchestrator = orchestrator_with(llm, store.clone());

        let state = orchestrator.run_turn("s1", "hi").await.unwrap();
        assert_eq!(state.response, "hello");

        let loaded = store.load("s1").await.unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn component_failure_is_wrapped() {
        let store = Arc::new(MemorySessionStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let orchestrator = orchestrator_with(llm, store);

        let err = orchestrator.run_turn("s1", "hi").await.unwrap_err();
        match err {
            AgentError::OrchestrationFailed(inner) => {
                assert!(matches!(*inner, AgentError::LlmUnavailable(_)))
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn save_failure_leaves_store_untouched() {
        let store = Arc::new(SaveFailsStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![ChatMessage::assistant("hello")]));
        let orchestrator = orchestrator_with(llm, store.clone());

        let err = orchestrator.run_turn("s1", "hi").await.unwrap_err();
        assert!(matches!(err, AgentError::OrchestrationFailed(_)));

        // 失败的回合没有写入任何东西，load 仍是默认初始状态
        let loaded = store.load("s1").await.unwrap();
        assert_eq!(loaded, SessionState::new("s1"));
    }
}
