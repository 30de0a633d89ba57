//! 会话状态：持久化的对话记忆单元
//!
//! 以 session_id 为主键整行读写；conversation_history 即喂给 LLM 的对话转写
//! （顺序有语义），retrieved_context 每轮检索后整体替换，response 为最近一次终态回答。

use serde::{Deserialize, Serialize};

/// 对话转写中的角色（只收录 user / assistant，工具消息不落库）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// 对话转写中的一条记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
        }
    }
}

/// 最近一轮检索得到的上下文片段；metadata 为开放键值，序列化时平铺到同级
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub content: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ContextChunk {
    /// 只有文本内容的片段
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// 一个会话的完整持久化状态
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// 主键，创建后不变
    pub session_id: String,
    /// 最近一次用户原始输入，每轮覆盖
    #[serde(default)]
    pub user_input: Option<String>,
    /// 对话转写，轮内只追加
    #[serde(default)]
    pub conversation_history: Vec<HistoryEntry>,
    /// 最近一轮检索结果，整体替换
    #[serde(default)]
    pub retrieved_context: Vec<ContextChunk>,
    /// 最近一次终态（无工具调用）回答
    #[serde(default)]
    pub response: String,
}

impl SessionState {
    /// 未见过的 session_id 对应的默认初始状态
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_input: None,
            conversation_history: Vec::new(),
            retrieved_context: Vec::new(),
            response: String::new(),
        }
    }
}
