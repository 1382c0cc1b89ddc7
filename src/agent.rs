//! Headless Agent 组装
//!
//! 从配置与环境变量构建 LLM 客户端、搜索工具、注册表与编排器；
//! 注册表构建一次后以 Arc 共享，每个会话各自持有一个 AgentOrchestrator。

use std::sync::Arc;

use crate::config::{load_system_prompt_template, AppConfig};
use crate::core::{system_prompt_for_today, AgentError, AgentOrchestrator, SearchNudge};
use crate::llm::{create_client, LlmClient, ModelGateway, Provider};
use crate::tools::{
    LinkupClient, SearchOptions, SearchProvider, SearchTool, ToolExecutor, ToolRegistry,
};

/// 可跨会话共享的组件
#[derive(Clone)]
pub struct AgentComponents {
    pub llm: Arc<dyn LlmClient>,
    pub registry: Arc<ToolRegistry>,
    pub system_prompt: String,
    pub nudge: SearchNudge,
    pub max_context_turns: usize,
}

impl AgentComponents {
    /// 用给定的 LLM 与搜索提供方组装（测试或自定义后端）
    pub fn assemble(
        cfg: &AppConfig,
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
    ) -> Result<Self, AgentError> {
        let options = SearchOptions {
            depth: cfg.tools.search.depth,
            output_type: cfg.tools.search.output_type,
        };
        let mut registry = ToolRegistry::new();
        registry
            .register(SearchTool::new(search, options, cfg.tools.search.max_result_chars))
            .map_err(|e| AgentError::ConfigError(e.to_string()))?;

        Ok(Self {
            llm,
            registry: Arc::new(registry),
            system_prompt: system_prompt_for_today(&load_system_prompt_template(cfg)),
            nudge: SearchNudge::new(
                cfg.agent.search_nudge,
                cfg.agent.force_search_keywords.clone(),
            ),
            max_context_turns: cfg.app.max_context_turns,
        })
    }

    /// 新建一个会话
    pub fn new_session(&self) -> AgentOrchestrator {
        AgentOrchestrator::new(
            ModelGateway::new(self.llm.clone(), self.system_prompt.clone()),
            ToolExecutor::new(self.registry.clone()),
        )
        .with_search_nudge(self.nudge.clone())
        .with_max_context_turns(self.max_context_turns)
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 根据配置与环境变量创建组件；缺少 API Key 时返回 ConfigError，并列出每个变量是否已设置
pub fn create_agent_components(cfg: &AppConfig) -> Result<AgentComponents, AgentError> {
    let provider = Provider::parse(&cfg.llm.provider).ok_or_else(|| {
        AgentError::ConfigError(format!(
            "unknown llm provider '{}' (expected baseten or openai)",
            cfg.llm.provider
        ))
    })?;

    let llm_key = env_key(provider.api_key_env());
    let search_key = env_key("LINKUP_API_KEY");
    let (Some(llm_key), Some(search_key)) = (llm_key.clone(), search_key.clone()) else {
        let status = |set: bool| if set { "set" } else { "NOT SET" };
        return Err(AgentError::ConfigError(format!(
            "API keys not found. {}: {}, LINKUP_API_KEY: {}",
            provider.api_key_env(),
            status(llm_key.is_some()),
            status(search_key.is_some()),
        )));
    };

    let client = create_client(
        provider,
        cfg.llm.base_url.as_deref(),
        cfg.llm.model.as_deref(),
        &llm_key,
        cfg.llm.timeouts.request,
    );
    tracing::info!(provider = provider.name(), model = client.model(), "Using LLM");

    let search = LinkupClient::new(
        cfg.tools.search.base_url.as_deref(),
        search_key,
        cfg.tools.search.timeout_secs,
    );

    AgentComponents::assemble(cfg, Arc::new(client), Arc::new(search))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::tools::{SearchError, SearchHits};
    use async_trait::async_trait;

    struct NoSearch;

    #[async_trait]
    impl SearchProvider for NoSearch {
        fn name(&self) -> &str {
            "none"
        }

        async fn search(&self, _q: &str, _o: &SearchOptions) -> Result<SearchHits, SearchError> {
            Err(SearchError::Transport("offline".into()))
        }
    }

    #[test]
    fn test_assemble_registers_search_tool() {
        let cfg = AppConfig::default();
        let components =
            AgentComponents::assemble(&cfg, Arc::new(MockLlmClient::new()), Arc::new(NoSearch))
                .unwrap();
        assert_eq!(components.registry.tool_names(), vec!["search_web"]);
        assert!(components.system_prompt.contains("search_web"));
        assert!(!components.system_prompt.contains("{today}"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "gemini".to_string();
        match create_agent_components(&cfg) {
            Err(AgentError::ConfigError(msg)) => assert!(msg.contains("gemini")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected config error"),
        }
    }
}
