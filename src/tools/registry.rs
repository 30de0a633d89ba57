//! 工具注册表
//!
//! 工具实现 Tool trait（name / description / parameters_schema / execute），
//! 由 ToolRegistry 按名注册与查找。注册在启动期静态完成，运行期只读，
//! LLM 按名请求时由状态机解析到对应实现。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::llm::ToolSpec;

/// 工具执行错误：参数不符合 schema 与执行期失败分开表达。
/// 前者中止本轮，后者以错误文本回填给下一次决策
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Failed(String),
}

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 生成发送给 LLM 的工具声明列表
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn name(&self) -> &str {
            "ping"
        }

        fn description(&self) -> &str {
            "Reply pong."
        }

        async fn execute(&self, _args: Value) -> Result<String, ToolError> {
            Ok("pong".to_string())
        }
    }

    #[tokio::test]
    async fn register_then_lookup_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);

        assert_eq!(registry.tool_names(), vec!["ping".to_string()]);
        let tool = registry.get("ping").unwrap();
        assert_eq!(
            tool.execute(serde_json::json!({})).await.unwrap(),
            "pong"
        );
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn specs_expose_default_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);

        let specs = registry.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "ping");
        assert_eq!(specs[0].parameters["type"], "object");
    }
}
