//! 错误类型
//!
//! - ToolError：工具层错误；DuplicateTool 只在注册时出现，其余都在当前轮内恢复，写成 tool 结果交回模型
//! - AgentError：编排器对调用方暴露的错误，对当前轮是致命的，但会话继续

use thiserror::Error;

/// 工具注册、解析、参数解码与执行过程中的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// 参数缺失或类型不符
    #[error("Invalid arguments for {tool}: {detail}")]
    InvalidArgument { tool: String, detail: String },

    /// 参数文本无法解码为 JSON 对象
    #[error("Malformed arguments for {tool}: {detail}")]
    MalformedArguments { tool: String, detail: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    /// 工具本身失败（如搜索服务不可用）
    #[error("Tool {tool} failed: {cause}")]
    ExecutionFailed { tool: String, cause: String },
}

impl ToolError {
    pub fn invalid(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

/// 编排器错误：对当前轮致命，已写入的转录保持不变
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Empty input")]
    EmptyInput,

    /// 模型既没有给出文本，也没有工具调用
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// 与模型（或其它上游）通信失败
    #[error("Upstream error from {provider}: {cause}")]
    Upstream { provider: String, cause: String },

    /// 第二轮（综合）仍请求工具且没有任何文本
    #[error("Model requested tools again during synthesis and produced no answer")]
    UnexpectedSecondRoundToolRequest,

    /// 调用方中断（如 Ctrl-C）
    #[error("Interrupted")]
    Interrupted,

    #[error("Config error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_message() {
        let err = ToolError::UnknownTool("fetch_page".to_string());
        assert_eq!(err.to_string(), "Unknown tool: fetch_page");
    }

    #[test]
    fn test_upstream_keeps_provider() {
        let err = AgentError::Upstream {
            provider: "baseten".to_string(),
            cause: "401 Unauthorized".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("baseten"));
        assert!(msg.contains("401"));
    }
}
