//! 记忆层：瞬态对话消息与持久化会话存储

pub mod message;
pub mod session_store;

pub use message::{ChatMessage, Role, ToolCallRequest};
pub use session_store::{
    create_session_store, MemorySessionStore, PostgresSessionStore, SessionStore,
};
