//! 单轮对话状态机
//!
//! Start → GuardInput → Decide → {Respond | ExecuteTools → Decide}。
//! Start 重放会话历史并追加本轮用户输入；Decide 交给 LLM，带 tool_calls 则进入
//! ExecuteTools 顺序执行并逐条回填结果，再回到 Decide；第一条不带工具调用的
//! assistant 消息即终态，Respond 把它折叠回 SessionState。
//! 每一步都是值进值出：消费旧状态，返回新状态，不依赖共享可变字段。

use std::sync::Arc;

use serde_json::Value;

use crate::core::{AgentError, ContextChunk, HistoryEntry, HistoryRole, SessionState};
use crate::llm::LlmClient;
use crate::memory::{ChatMessage, ToolCallRequest};
use crate::tools::{ToolError, ToolRegistry};

/// 固定的编排指令（system prompt）
const SYSTEM_PROMPT: &str = "You are a RAG agent. \
Analyze the user's question and determine if it is a question about the knowledge base or a general question. \
If it is a general question, answer it based on your knowledge. \
If it is a question about the AI, LLM, RAG, or any other AI-related topic, \
use the `retrieve_context` tool to fetch relevant information. \
If the knowledge base returns no relevant results, acknowledge this and provide general assistance.";

/// 空输入时的固定回答（不触发决策，也不写历史）
const EMPTY_INPUT_RESPONSE: &str = "Please provide a question.";

/// 状态机相位；单入单出：Start 进，Respond 出
enum TurnPhase {
    GuardInput,
    Decide,
    ExecuteTools(ChatMessage),
    Respond(ChatMessage),
}

/// 单轮状态机：每次 run 消费一个 SessionState，返回更新后的新值
pub struct TurnMachine {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    /// Decide ↔ ExecuteTools 轮数上限；0 表示不限
    max_tool_hops: usize,
}

impl TurnMachine {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, max_tool_hops: usize) -> Self {
        Self {
            llm,
            tools,
            max_tool_hops,
        }
    }

    /// 执行一轮：终态回答写入 response，user 输入与回答追加进历史，
    /// retrieved_context 整体替换为本轮工具结果中的片段
    pub async fn run(
        &self,
        state: SessionState,
        user_input: &str,
    ) -> Result<SessionState, AgentError> {
        if user_input.trim().is_empty() {
            let mut state = state;
            state.user_input = Some(user_input.to_string());
            state.response = EMPTY_INPUT_RESPONSE.to_string();
            return Ok(state);
        }

        let mut messages = seed_messages(&state, user_input);
        let specs = self.tools.specs();
        let mut turn_contexts: Vec<String> = Vec::new();
        let mut hops = 0usize;

        let mut phase = TurnPhase::GuardInput;
        loop {
            phase = match phase {
                // 预留的输入校验点：当前直通，保持图结构不变
                TurnPhase::GuardInput => TurnPhase::Decide,

                TurnPhase::Decide => {
                    let decision = self.llm.decide(&messages, &specs).await?;
                    if decision.is_terminal() {
                        TurnPhase::Respond(decision)
                    } else {
                        TurnPhase::ExecuteTools(decision)
                    }
                }

                TurnPhase::ExecuteTools(decision) => {
                    if self.max_tool_hops > 0 && hops >= self.max_tool_hops {
                        return Err(AgentError::ToolLoopExceeded(hops));
                    }
                    hops += 1;

                    let calls = decision.tool_calls.clone();
                    messages.push(decision);
                    for call in &calls {
                        let result = self.execute_call(call, &mut turn_contexts).await?;
                        messages.push(ChatMessage::tool(call.id.clone(), result));
                    }
                    TurnPhase::Decide
                }

                TurnPhase::Respond(answer) => {
                    return Ok(fold_response(
                        state,
                        user_input,
                        &answer.content,
                        turn_contexts,
                    ));
                }
            };
        }
    }

    /// 执行单个工具调用。未知工具与执行期失败以错误文本回填（让 LLM 留在循环里
    /// 重试或致歉）；参数不符合 schema 则中止本轮。
    async fn execute_call(
        &self,
        call: &ToolCallRequest,
        turn_contexts: &mut Vec<String>,
    ) -> Result<String, AgentError> {
        let Some(tool) = self.tools.get(&call.name) else {
            tracing::warn!(tool = %call.name, "unknown tool requested");
            return Ok(format!("error: unknown tool: {}", call.name));
        };

        let args: Value = serde_json::from_str(&call.arguments).map_err(|e| {
            AgentError::MalformedToolInvocation {
                tool: call.name.clone(),
                reason: e.to_string(),
            }
        })?;

        match tool.execute(args).await {
            Ok(result) => {
                collect_contexts(&result, turn_contexts);
                Ok(result)
            }
            Err(ToolError::InvalidArguments(reason)) => Err(AgentError::MalformedToolInvocation {
                tool: call.name.clone(),
                reason,
            }),
            Err(ToolError::Failed(reason)) => {
                tracing::warn!(tool = %call.name, error = %reason, "tool execution failed");
                Ok(format!("error: {}", reason))
            }
        }
    }
}

/// 历史重放 + 本轮用户输入；首条固定为 system 指令
fn seed_messages(state: &SessionState, user_input: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(state.conversation_history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    for entry in &state.conversation_history {
        messages.push(match entry.role {
            HistoryRole::User => ChatMessage::user(entry.content.clone()),
            HistoryRole::Assistant => ChatMessage::assistant(entry.content.clone()),
        });
    }
    messages.push(ChatMessage::user(user_input));
    messages
}

/// 从工具结果里提取 retrieved_contexts 片段；非该结构的结果忽略
fn collect_contexts(result: &str, turn_contexts: &mut Vec<String>) {
    let Ok(value) = serde_json::from_str::<Value>(result) else {
        return;
    };
    if let Some(items) = value.get("retrieved_contexts").and_then(Value::as_array) {
        turn_contexts.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
    }
}

/// Respond：把终态回答折叠回 SessionState
fn fold_response(
    mut state: SessionState,
    user_input: &str,
    response: &str,
    turn_contexts: Vec<String>,
) -> SessionState {
    state.user_input = Some(user_input.to_string());
    state.response = response.to_string();
    state.conversation_history.push(HistoryEntry::user(user_input));
    state
        .conversation_history
        .push(HistoryEntry::assistant(response));
    state.retrieved_context = turn_contexts.into_iter().map(ContextChunk::text).collect();
    state
}
