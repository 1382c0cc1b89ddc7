//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FORAGER__*` 覆盖（双下划线表示嵌套，如 `FORAGER__LLM__PROVIDER=openai`）。
//! API Key 不放在配置里，只从环境变量读取（BASETEN_API_KEY / OPENAI_API_KEY / LINKUP_API_KEY）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::prompt::default_force_search_keywords;
use crate::tools::{OutputType, SearchDepth};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub tools: ToolsSection,
    pub agent: AgentSection,
}

/// [app] 段：应用名、上下文轮数、system prompt 文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 发给模型的最近对话轮数（按 user 输入计）
    pub max_context_turns: usize,
    /// 覆盖内置 system prompt 的文件，支持 {today} / {year} 占位符
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_context_turns: 10,
            system_prompt_path: None,
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：baseten / openai
    pub provider: String,
    /// 为空时使用提供方默认模型
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "baseten".to_string(),
            model: None,
            base_url: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 120 }
    }
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ToolsSection {
    pub search: SearchSection,
}

/// [tools.search] 段：Linkup 端点、深度、输出模式、超时与结果长度上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub base_url: Option<String>,
    pub depth: SearchDepth,
    pub output_type: OutputType,
    pub timeout_secs: u64,
    pub max_result_chars: usize,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            base_url: None,
            depth: SearchDepth::Standard,
            output_type: OutputType::SearchResults,
            timeout_secs: 30,
            max_result_chars: 8000,
        }
    }
}

/// [agent] 段：关键词搜索提示
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub search_nudge: bool,
    pub force_search_keywords: Vec<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            search_nudge: true,
            force_search_keywords: default_force_search_keywords(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 FORAGER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FORAGER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FORAGER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 读取 system prompt 模板：配置文件优先，其次 config/prompts/system.txt，最后内置默认
pub fn load_system_prompt_template(cfg: &AppConfig) -> String {
    let configured = cfg.app.system_prompt_path.iter().cloned();
    let fallbacks = ["config/prompts/system.txt", "../config/prompts/system.txt"]
        .into_iter()
        .map(PathBuf::from);
    configured
        .chain(fallbacks)
        .find_map(|p| std::fs::read_to_string(p).ok())
        .unwrap_or_else(|| crate::core::DEFAULT_SYSTEM_PROMPT.to_string())
}
