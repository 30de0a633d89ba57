//! 核心：错误分类、会话状态、编排器

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::AgentError;
pub use orchestrator::Orchestrator;
pub use state::{ContextChunk, HistoryEntry, HistoryRole, SessionState};
