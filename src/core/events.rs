//! 单轮过程事件：供终端或其它前端展示思考、工具调用与结果

use serde::Serialize;

/// 过程事件（可序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// 正在调用模型；pass 为 1（推理）或 2（综合）
    Thinking { pass: u8 },
    ToolCall {
        id: String,
        tool: String,
        arguments: String,
    },
    /// 工具返回（预览，避免过长）
    ToolResult {
        id: String,
        tool: String,
        ok: bool,
        preview: String,
    },
    Answer { text: String },
    Error { text: String },
}
