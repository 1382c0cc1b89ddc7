//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Baseten / Mock）实现 LlmClient：一次请求 / 响应交换，
//! 输入为转录与可用工具 schema，输出为文本和/或工具调用。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::{ToolInvocation, Turn};
use crate::tools::ToolSchema;

/// 模型协作方的错误（对网关而言是不透明的失败）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited (retry after {retry_after_ms} ms)")]
    RateLimited { retry_after_ms: u64 },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("api error: {0}")]
    Api(String),
}

/// 模型单次回复（未分类的原始形态）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl LlmReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tools(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 提供方名称（用于错误与日志）
    fn provider(&self) -> &str;

    /// 一次完成请求；tools 为空时不声明任何工具
    async fn complete(&self, turns: &[Turn], tools: &[ToolSchema]) -> Result<LlmReply, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
