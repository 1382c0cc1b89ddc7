//! 短期记忆：会话转录（Transcript）
//!
//! 按顺序保存 user / assistant / tool 三类 Turn；只追加，除非整体 reset。
//! 发给模型时只取最近 N 轮（window），窗口总是从 user Turn 开始，避免孤立的 tool 结果。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 消息角色（与 LLM API 一致；System 只由 ModelGateway 临时拼接，不进入转录）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

/// 模型发起的一次工具调用
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// 由模型生成，在同一条 assistant Turn 内唯一
    pub id: String,
    pub name: String,
    /// 原始参数文本（JSON），由 ToolSchema::decode 校验后才交给工具
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// 以 JSON 值构造（测试与 Mock 用）
    pub fn with_json(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self::new(id, name, arguments.to_string())
    }
}

/// 单条转录记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_invocation_id: Option<String>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_invocations: Vec::new(),
            tool_invocation_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_invocations: Vec::new(),
            tool_invocation_id: None,
        }
    }

    /// 携带工具调用的 assistant Turn（content 可为空）
    pub fn assistant_with_tools(content: impl Into<String>, invocations: Vec<ToolInvocation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_invocations: invocations,
            tool_invocation_id: None,
        }
    }

    pub fn tool_result(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_invocations: Vec::new(),
            tool_invocation_id: Some(invocation_id.into()),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_invocations: Vec::new(),
            tool_invocation_id: None,
        }
    }

    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_invocations.is_empty()
    }
}

/// 转录不变量被破坏时的描述
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptViolation {
    #[error("tool result at {index} has no invocation id")]
    MissingInvocationId { index: usize },
    #[error("tool result at {index} answers unknown or already resolved invocation '{id}'")]
    OrphanedToolResult { index: usize, id: String },
}

/// 单会话的对话状态：由 AgentOrchestrator 独占
#[derive(Clone, Debug, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// 会话重置（唯一允许的非追加修改）
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// 最近 max_user_turns 轮对话（从第 max_user_turns 个倒数 user Turn 开始）；0 表示不限制
    pub fn window(&self, max_user_turns: usize) -> &[Turn] {
        if max_user_turns == 0 {
            return &self.turns;
        }
        let mut seen = 0;
        for (idx, turn) in self.turns.iter().enumerate().rev() {
            if turn.role == Role::User {
                seen += 1;
                if seen == max_user_turns {
                    return &self.turns[idx..];
                }
            }
        }
        &self.turns
    }

    /// 校验引用不变量：每条 tool Turn 必须对应紧邻的 assistant Turn 中一个尚未回答的调用
    pub fn validate(&self) -> Result<(), TranscriptViolation> {
        let mut pending: Vec<&str> = Vec::new();
        for (index, turn) in self.turns.iter().enumerate() {
            match turn.role {
                Role::Tool => {
                    let id = turn
                        .tool_invocation_id
                        .as_deref()
                        .ok_or(TranscriptViolation::MissingInvocationId { index })?;
                    match pending.iter().position(|p| *p == id) {
                        Some(pos) => {
                            pending.remove(pos);
                        }
                        None => {
                            return Err(TranscriptViolation::OrphanedToolResult {
                                index,
                                id: id.to_string(),
                            })
                        }
                    }
                }
                Role::Assistant => {
                    pending = turn.tool_invocations.iter().map(|i| i.id.as_str()).collect();
                }
                Role::User | Role::System => pending.clear(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_exchange(state: &mut ConversationState, question: &str, id: &str) {
        state.push(Turn::user(question));
        state.push(Turn::assistant_with_tools(
            "",
            vec![ToolInvocation::new(id, "search_web", r#"{"query":"q"}"#)],
        ));
        state.push(Turn::tool_result(id, "Search Results:"));
        state.push(Turn::assistant("answer"));
    }

    #[test]
    fn test_validate_accepts_matched_results() {
        let mut state = ConversationState::new();
        tool_exchange(&mut state, "first", "t1");
        tool_exchange(&mut state, "second", "t1");
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_orphan() {
        let mut state = ConversationState::new();
        state.push(Turn::user("hi"));
        state.push(Turn::tool_result("t9", "late result"));
        assert_eq!(
            state.validate(),
            Err(TranscriptViolation::OrphanedToolResult {
                index: 1,
                id: "t9".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_double_answer() {
        let mut state = ConversationState::new();
        state.push(Turn::user("hi"));
        state.push(Turn::assistant_with_tools(
            "",
            vec![ToolInvocation::new("t1", "search_web", "{}")],
        ));
        state.push(Turn::tool_result("t1", "a"));
        state.push(Turn::tool_result("t1", "b"));
        assert!(matches!(
            state.validate(),
            Err(TranscriptViolation::OrphanedToolResult { index: 3, .. })
        ));
    }

    #[test]
    fn test_window_starts_at_user_turn() {
        let mut state = ConversationState::new();
        tool_exchange(&mut state, "first", "t1");
        state.push(Turn::user("second"));
        state.push(Turn::assistant("plain"));
        tool_exchange(&mut state, "third", "t2");

        let window = state.window(2);
        assert_eq!(window.len(), 6);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[0].content, "second");
        assert_eq!(state.window(0).len(), state.len());
        assert_eq!(state.window(10).len(), state.len());
    }

    #[test]
    fn test_reset_clears_turns() {
        let mut state = ConversationState::new();
        tool_exchange(&mut state, "first", "t1");
        state.reset();
        assert!(state.is_empty());
    }
}
