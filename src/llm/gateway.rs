//! ModelGateway：对模型协作方的一次请求 / 响应交换
//!
//! 负责拼接 system prompt（不进入会话转录）、把原始回复分类为 Direct / ToolRequested，
//! 并把协作方错误统一为 AgentError::Upstream。网关内部不循环、不重试。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{LlmClient, LlmReply};
use crate::memory::{ToolInvocation, Turn};
use crate::tools::ToolSchema;

/// 网关输出：二选一，下游必须处理两种情况
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    Direct(String),
    /// 请求执行工具；text 为模型随调用一起给出的文字（可能为空）
    ToolRequested {
        invocations: Vec<ToolInvocation>,
        text: Option<String>,
    },
}

impl ModelResponse {
    /// 把原始回复分类；既无文字又无工具调用视为协议违规
    pub fn classify(reply: LlmReply) -> Result<Self, AgentError> {
        // 只用 trim 判断是否为空，保留原文
        let text = reply.content.filter(|c| !c.trim().is_empty());
        match (reply.tool_calls.is_empty(), text) {
            (false, text) => Ok(ModelResponse::ToolRequested {
                invocations: reply.tool_calls,
                text,
            }),
            (true, Some(text)) => Ok(ModelResponse::Direct(text)),
            (true, None) => Err(AgentError::MalformedResponse(
                "model returned neither text nor tool invocations".to_string(),
            )),
        }
    }
}

/// 模型网关：持有 LLM 客户端与基础 system prompt
pub struct ModelGateway {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl ModelGateway {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn provider(&self) -> &str {
        self.llm.provider()
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    pub async fn converse(
        &self,
        transcript: &[Turn],
        tools: &[ToolSchema],
    ) -> Result<ModelResponse, AgentError> {
        self.converse_with_directive(transcript, tools, None).await
    }

    /// 与 converse 相同，但可在 system prompt 后追加一条本次请求专用的指令
    pub async fn converse_with_directive(
        &self,
        transcript: &[Turn],
        tools: &[ToolSchema],
        directive: Option<&str>,
    ) -> Result<ModelResponse, AgentError> {
        let mut messages = Vec::with_capacity(transcript.len() + 2);
        if !self.system_prompt.is_empty() {
            messages.push(Turn::system(self.system_prompt.clone()));
        }
        if let Some(d) = directive {
            messages.push(Turn::system(d.to_string()));
        }
        messages.extend_from_slice(transcript);

        let reply = self
            .llm
            .complete(&messages, tools)
            .await
            .map_err(|e| AgentError::Upstream {
                provider: self.llm.provider().to_string(),
                cause: e.to_string(),
            })?;
        ModelResponse::classify(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};
    use crate::memory::Role;

    #[test]
    fn test_classify_variants() {
        assert_eq!(
            ModelResponse::classify(LlmReply::text("Paris.")).unwrap(),
            ModelResponse::Direct("Paris.".to_string())
        );

        let inv = ToolInvocation::new("t1", "search_web", "{}");
        let mut reply = LlmReply::tools(vec![inv.clone()]);
        reply.content = Some("  ".to_string());
        assert_eq!(
            ModelResponse::classify(reply).unwrap(),
            ModelResponse::ToolRequested {
                invocations: vec![inv],
                text: None
            }
        );
    }

    #[test]
    fn test_classify_keeps_text_verbatim() {
        assert_eq!(
            ModelResponse::classify(LlmReply::text("  Paris.\n")).unwrap(),
            ModelResponse::Direct("  Paris.\n".to_string())
        );
    }

    #[test]
    fn test_classify_empty_is_malformed() {
        let err = ModelResponse::classify(LlmReply::default()).unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse(_)));
        let err = ModelResponse::classify(LlmReply::text("   ")).unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_system_prompt_and_directive_prepended() {
        let llm = Arc::new(MockLlmClient::with_replies([Ok(LlmReply::text("ok"))]));
        let gateway = ModelGateway::new(llm.clone(), "base prompt");
        let transcript = vec![Turn::user("hello")];
        gateway
            .converse_with_directive(&transcript, &[], Some("use the tool"))
            .await
            .unwrap();

        let req = &llm.requests()[0];
        assert_eq!(req.turns.len(), 3);
        assert_eq!(req.turns[0].role, Role::System);
        assert_eq!(req.turns[0].content, "base prompt");
        assert_eq!(req.turns[1].content, "use the tool");
        assert_eq!(req.turns[2].content, "hello");
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_provider() {
        let llm = Arc::new(MockLlmClient::with_replies([Err(LlmError::Auth(
            "invalid api key".to_string(),
        ))]));
        let gateway = ModelGateway::new(llm, "");
        match gateway.converse(&[Turn::user("hi")], &[]).await {
            Err(AgentError::Upstream { provider, cause }) => {
                assert_eq!(provider, "mock");
                assert!(cause.contains("invalid api key"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
