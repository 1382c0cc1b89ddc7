//! 终端渲染：把过程事件、回答、错误与转录格式化为带颜色的文本

use crossterm::style::Stylize;

use crate::core::AgentEvent;
use crate::memory::{ConversationState, Role};
use crate::tools::SearchTool;

/// 事件渲染为一行；Answer / Error 由会话循环自己输出，这里返回 None
pub fn render_event(ev: &AgentEvent) -> Option<String> {
    match ev {
        AgentEvent::Thinking { pass: 1 } => None,
        AgentEvent::Thinking { .. } => {
            Some(format!("{}", "🤖 [Synthesis]: Composing answer...".dark_grey()))
        }
        AgentEvent::ToolCall {
            tool, arguments, ..
        } => {
            let line = if tool == SearchTool::NAME {
                let query = serde_json::from_str::<serde_json::Value>(arguments)
                    .ok()
                    .and_then(|v| v.get("query").and_then(|q| q.as_str()).map(String::from))
                    .unwrap_or_default();
                format!("🔍 [Action]: Searching for '{query}'...")
            } else {
                format!("🔧 [Action]: Calling {tool}...")
            };
            Some(format!("{}", line.cyan()))
        }
        AgentEvent::ToolResult { ok: true, tool, .. } => {
            Some(format!("{}", format!("✓ {tool} completed").green()))
        }
        AgentEvent::ToolResult {
            ok: false, preview, ..
        } => Some(format!("{}", format!("✗ {preview}").yellow())),
        AgentEvent::Answer { .. } | AgentEvent::Error { .. } => None,
    }
}

pub fn render_answer(text: &str) -> String {
    format!("{} {}\n", "💡 Agent:".green().bold(), text)
}

pub fn render_error(text: &str) -> String {
    format!("{} {}", "❌ Error:".red().bold(), text)
}

/// 转录展示（/history）
pub fn render_transcript(state: &ConversationState) -> String {
    if state.is_empty() {
        return "(empty conversation)".to_string();
    }
    let mut out = String::new();
    for turn in state.turns() {
        let line = match turn.role {
            Role::User => format!("{} {}", "You:".bold(), turn.content),
            Role::Assistant if turn.requests_tools() => {
                let calls: Vec<String> = turn
                    .tool_invocations
                    .iter()
                    .map(|i| format!("{}({})", i.name, i.arguments))
                    .collect();
                format!("{} {}", "Agent → tools:".dark_grey(), calls.join(", "))
            }
            Role::Assistant => format!("{} {}", "Agent:".green(), turn.content),
            Role::Tool => {
                let preview: String = turn.content.chars().take(120).collect();
                format!(
                    "{} {}",
                    format!("[{}]", turn.tool_invocation_id.as_deref().unwrap_or("?")).dark_grey(),
                    preview
                )
            }
            Role::System => format!("{} {}", "System:".dark_grey(), turn.content),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ToolInvocation, Turn};

    #[test]
    fn test_render_search_call() {
        let line = render_event(&AgentEvent::ToolCall {
            id: "t1".into(),
            tool: "search_web".into(),
            arguments: r#"{"query":"NVIDIA stock price"}"#.into(),
        })
        .unwrap();
        assert!(line.contains("Searching for 'NVIDIA stock price'"));
    }

    #[test]
    fn test_answer_and_first_pass_are_silent() {
        assert!(render_event(&AgentEvent::Thinking { pass: 1 }).is_none());
        assert!(render_event(&AgentEvent::Answer { text: "x".into() }).is_none());
    }

    #[test]
    fn test_render_transcript() {
        let mut state = ConversationState::new();
        state.push(Turn::user("What is the current Bitcoin price?"));
        state.push(Turn::assistant_with_tools(
            "",
            vec![ToolInvocation::new("t1", "search_web", r#"{"query":"btc"}"#)],
        ));
        state.push(Turn::tool_result("t1", "Search Results:"));
        state.push(Turn::assistant("Bitcoin is currently $X."));
        let text = render_transcript(&state);
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("search_web"));
        assert!(text.contains("Bitcoin is currently $X."));
    }
}
