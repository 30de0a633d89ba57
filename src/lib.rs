//! Wren - Rust RAG 问答智能体
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、会话状态、编排器
//! - **llm**: LLM 决策客户端（OpenAI 兼容 / Mock）与嵌入客户端
//! - **memory**: 瞬态对话消息与会话存储（内存 / Postgres）
//! - **retrieval**: 向量索引客户端与检索器
//! - **tools**: 工具注册表与 retrieve_context 工具
//! - **turn**: 单轮对话状态机（Decide ↔ ExecuteTools 循环）
//! - **service**: HTTP 边界（axum：/chat、/health_check）

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod retrieval;
pub mod service;
pub mod tools;
pub mod turn;
