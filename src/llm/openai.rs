//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 Baseten、OpenAI、自建代理等。
//! 转录中的 assistant 工具调用与 tool 结果按 function-calling 协议映射。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionTools,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, LlmReply};
use crate::memory::{Role, ToolInvocation, Turn};
use crate::tools::ToolSchema;

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容客户端：持有 Client、提供方名称与 model 名
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    provider: String,
    model: String,
    request_timeout: Duration,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(
        provider: &str,
        base_url: Option<&str>,
        model: &str,
        api_key: &str,
        request_timeout_secs: u64,
    ) -> Self {
        let config = match base_url {
            Some(url) => OpenAIConfig::new().with_api_base(url).with_api_key(api_key),
            None => OpenAIConfig::new().with_api_key(api_key),
        };

        Self {
            client: Client::with_config(config),
            provider: provider.to_string(),
            model: model.to_string(),
            request_timeout: Duration::from_secs(request_timeout_secs),
            usage: TokenUsage::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_openai_messages(
        &self,
        turns: &[Turn],
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        turns
            .iter()
            .map(|t| {
                Ok(match t.role {
                    Role::System => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessageArgs::default()
                            .content(t.content.clone())
                            .build()?,
                    ),
                    Role::User => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(t.content.clone())
                            .build()?,
                    ),
                    Role::Assistant => {
                        let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                        if !t.content.is_empty() {
                            args.content(t.content.clone());
                        }
                        if !t.tool_invocations.is_empty() {
                            args.tool_calls(
                                t.tool_invocations
                                    .iter()
                                    .map(|i| {
                                        ChatCompletionMessageToolCalls::Function(
                                            ChatCompletionMessageToolCall {
                                                id: i.id.clone(),
                                                function: FunctionCall {
                                                    name: i.name.clone(),
                                                    arguments: i.arguments.clone(),
                                                },
                                            },
                                        )
                                    })
                                    .collect::<Vec<_>>(),
                            );
                        }
                        ChatCompletionRequestMessage::Assistant(args.build()?)
                    }
                    Role::Tool => ChatCompletionRequestMessage::Tool(
                        ChatCompletionRequestToolMessageArgs::default()
                            .content(t.content.clone())
                            .tool_call_id(t.tool_invocation_id.clone().unwrap_or_default())
                            .build()?,
                    ),
                })
            })
            .collect()
    }

    fn to_openai_tools(tools: &[ToolSchema]) -> Result<Vec<ChatCompletionTools>, OpenAIError> {
        tools
            .iter()
            .map(|s| {
                let function = FunctionObjectArgs::default()
                    .name(s.name.clone())
                    .description(s.description.clone())
                    .parameters(s.to_json_schema())
                    .build()?;
                Ok(ChatCompletionTools::Function(ChatCompletionTool { function }))
            })
            .collect()
    }
}

/// 把 async_openai 错误归类为 LlmError
fn classify_error(err: OpenAIError) -> LlmError {
    match err {
        OpenAIError::ApiError(api) => {
            let lower = api.message.to_lowercase();
            if lower.contains("api key") || lower.contains("unauthorized") || lower.contains("authentication") {
                LlmError::Auth(api.message)
            } else if lower.contains("rate limit") {
                LlmError::RateLimited { retry_after_ms: 0 }
            } else {
                LlmError::Api(api.message)
            }
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg),
        other => LlmError::Transport(other.to_string()),
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn complete(&self, turns: &[Turn], tools: &[ToolSchema]) -> Result<LlmReply, LlmError> {
        let messages = self.to_openai_messages(turns).map_err(classify_error)?;
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages);
        if !tools.is_empty() {
            builder.tools(Self::to_openai_tools(tools).map_err(classify_error)?);
        }
        let request = builder.build().map_err(classify_error)?;

        tracing::debug!(provider = %self.provider, model = %self.model, tools = tools.len(), "chat completion request");
        let response = tokio::time::timeout(self.request_timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                LlmError::Transport(format!(
                    "request timed out after {}s",
                    self.request_timeout.as_secs()
                ))
            })?
            .map_err(classify_error)?;

        // 提取 token 使用统计
        if let Some(usage) = &response.usage {
            self.usage
                .add(usage.prompt_tokens as u64, usage.completion_tokens as u64);
        }

        let Some(choice) = response.choices.into_iter().next() else {
            return Ok(LlmReply::default());
        };
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|call| match call {
                ChatCompletionMessageToolCalls::Function(f) => Some(ToolInvocation::new(
                    f.id,
                    f.function.name,
                    f.function.arguments,
                )),
                #[allow(unreachable_patterns)]
                _ => {
                    tracing::warn!("ignoring non-function tool call");
                    None
                }
            })
            .collect();

        Ok(LlmReply {
            content: choice.message.content,
            tool_calls,
        })
    }
}
