//! 模型提供方预设（OpenAI 兼容格式）
//!
//! - Baseten: https://inference.baseten.co/v1，默认 DeepSeek-V3（工具调用能力较好）
//! - OpenAI: 官方端点，默认 gpt-4o

use crate::llm::OpenAiClient;

pub const BASETEN_BASE_URL: &str = "https://inference.baseten.co/v1";
pub const BASETEN_DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3-0324";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

/// 支持的提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Baseten,
    OpenAi,
}

impl Provider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "baseten" => Some(Provider::Baseten),
            "openai" => Some(Provider::OpenAi),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Baseten => "baseten",
            Provider::OpenAi => "openai",
        }
    }

    /// 读取 API Key 的环境变量名
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Baseten => "BASETEN_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Provider::Baseten => Some(BASETEN_BASE_URL),
            Provider::OpenAi => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Baseten => BASETEN_DEFAULT_MODEL,
            Provider::OpenAi => OPENAI_DEFAULT_MODEL,
        }
    }
}

/// 创建提供方客户端
///
/// - base_url / model 为 None 时使用提供方默认值
/// - api_key 由调用方从环境变量读取
pub fn create_client(
    provider: Provider,
    base_url: Option<&str>,
    model: Option<&str>,
    api_key: &str,
    request_timeout_secs: u64,
) -> OpenAiClient {
    let base_url = base_url.or(provider.default_base_url());
    let model = model.unwrap_or(provider.default_model());
    OpenAiClient::new(provider.name(), base_url, model, api_key, request_timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert_eq!(Provider::parse("Baseten"), Some(Provider::Baseten));
        assert_eq!(Provider::parse(" openai "), Some(Provider::OpenAi));
        assert_eq!(Provider::parse("deepseek"), None);
    }

    #[test]
    fn test_defaults() {
        let client = create_client(Provider::Baseten, None, None, "k", 60);
        assert_eq!(client.model(), BASETEN_DEFAULT_MODEL);
        let client = create_client(Provider::OpenAi, None, Some("gpt-4o-mini"), "k", 60);
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}
