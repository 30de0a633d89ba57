//! 错误分类
//!
//! 组件级错误（检索上游 / LLM / 持久化 / 工具参数）各自不重试，
//! 由编排器在回合边界统一包装为 OrchestrationFailed 上抛。

use thiserror::Error;

/// 编排引擎错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 嵌入或向量检索上游不可达
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// LLM 推理传输失败或超时
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// 关系存储不可达或语句执行失败
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// LLM 请求的工具参数不符合声明的 schema
    #[error("Malformed tool invocation for {tool}: {reason}")]
    MalformedToolInvocation { tool: String, reason: String },

    /// 单轮内 Decide ↔ ExecuteTools 超过配置上限
    #[error("Tool loop exceeded after {0} rounds")]
    ToolLoopExceeded(usize),

    /// 回合边界的统一包装，原因见内层错误
    #[error("Orchestration failed: {0}")]
    OrchestrationFailed(#[source] Box<AgentError>),
}

impl AgentError {
    /// 包装为 OrchestrationFailed；已包装的错误原样返回
    pub fn into_orchestration_failure(self) -> AgentError {
        match self {
            AgentError::OrchestrationFailed(_) => self,
            other => AgentError::OrchestrationFailed(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_is_idempotent() {
        let err = AgentError::LlmUnavailable("timeout".to_string());
        let wrapped = err.into_orchestration_failure();
        assert!(matches!(wrapped, AgentError::OrchestrationFailed(_)));

        let rewrapped = wrapped.into_orchestration_failure();
        match rewrapped {
            AgentError::OrchestrationFailed(inner) => {
                assert!(matches!(*inner, AgentError::LlmUnavailable(_)))
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn display_includes_cause() {
        let err = AgentError::PersistenceUnavailable("pool exhausted".to_string())
            .into_orchestration_failure();
        assert_eq!(
            err.to_string(),
            "Orchestration failed: Persistence unavailable: pool exhausted"
        );
    }
}
