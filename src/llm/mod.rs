//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Baseten / Mock）及模型网关

pub mod gateway;
pub mod mock;
pub mod openai;
pub mod providers;
pub mod traits;

pub use gateway::{ModelGateway, ModelResponse};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use providers::{create_client, Provider};
pub use traits::{LlmClient, LlmError, LlmReply};
