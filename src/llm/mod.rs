//! LLM 层：决策客户端抽象与实现（OpenAI 兼容 / Mock）、嵌入客户端

pub mod embedding;
pub mod mock;
pub mod openai;
pub mod traits;

pub use embedding::{EmbeddingClient, OpenAiEmbedder};
pub use mock::{MockLlmClient, ScriptedLlm};
pub use openai::OpenAiLlm;
pub use traits::{LlmClient, ToolSpec};
