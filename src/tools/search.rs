//! Web 搜索工具
//!
//! SearchTool 是唯一注册给模型的工具（search_web）：校验 query 后调用 SearchProvider，
//! 把结果归一化为 SearchResult。传输或服务端错误在这里被吸收为 Failure，不会向上抛出；
//! 每次调用恰好一次外部请求，不重试。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::ToolError;
use crate::tools::{ParamSpec, ParamType, Tool, ToolArgs, ToolSchema};

/// 搜索深度（Linkup depth 参数）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Standard,
    Deep,
}

/// 输出模式：原始结果列表，或服务端合成的带来源答案
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputType {
    #[default]
    SearchResults,
    SourcedAnswer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub depth: SearchDepth,
    pub output_type: OutputType,
}

/// 单条结果
#[derive(Debug, Clone, PartialEq)]
pub struct SearchItem {
    /// 来源标识（通常为 URL）
    pub source: String,
    pub title: Option<String>,
    pub snippet: String,
    /// 服务端返回的其它结构化字段（如 type）
    pub fields: Map<String, Value>,
}

impl SearchItem {
    pub fn new(source: impl Into<String>, title: Option<String>, snippet: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title,
            snippet: snippet.into(),
            fields: Map::new(),
        }
    }
}

/// 成功的搜索负载；sourcedAnswer 模式下 answer 有值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub answer: Option<String>,
    pub items: Vec<SearchItem>,
}

/// 搜索服务错误（只在 SearchTool 内部出现）
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

/// 外部搜索能力
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchHits, SearchError>;
}

/// 归一化的搜索结果：总是以数据返回
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Success { query: String, hits: SearchHits },
    Failure { query: String, cause: String },
}

impl SearchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchResult::Success { .. })
    }

    /// 渲染为交给模型的 tool 结果文本
    pub fn render(&self) -> String {
        match self {
            SearchResult::Failure { cause, .. } => format!("Error searching: {cause}"),
            SearchResult::Success { query, hits } => {
                if let Some(answer) = &hits.answer {
                    let sources: Vec<&str> = hits.items.iter().map(|i| i.source.as_str()).collect();
                    return format!("Answer: {}\nSources: {}", answer, sources.join(", "));
                }
                if hits.items.is_empty() {
                    return format!("No results found for '{query}'.");
                }
                let blocks: Vec<String> = hits
                    .items
                    .iter()
                    .map(|i| {
                        format!(
                            "Title: {}\nURL: {}\nContent: {}",
                            i.title.as_deref().unwrap_or("(untitled)"),
                            i.source,
                            i.snippet
                        )
                    })
                    .collect();
                format!("Search Results:\n{}", blocks.join("\n\n"))
            }
        }
    }
}

fn truncate_chars(s: String, max_chars: usize) -> String {
    if max_chars == 0 || s.chars().count() <= max_chars {
        s
    } else {
        s.chars().take(max_chars).collect::<String>() + "\n...[truncated]"
    }
}

/// search_web 工具
pub struct SearchTool {
    provider: Arc<dyn SearchProvider>,
    options: SearchOptions,
    max_result_chars: usize,
    schema: ToolSchema,
}

impl SearchTool {
    pub const NAME: &'static str = "search_web";

    pub fn new(provider: Arc<dyn SearchProvider>, options: SearchOptions, max_result_chars: usize) -> Self {
        let schema = ToolSchema::new(
            Self::NAME,
            "Search the web for current information. Returns content from relevant sources. \
             Use this for any questions about current events, news, prices, or real-time data.",
        )
        .param(ParamSpec::required(
            "query",
            ParamType::String,
            "The search query to find information on the web (e.g. 'NVIDIA stock price')",
        ));
        Self {
            provider,
            options,
            max_result_chars,
            schema,
        }
    }

    /// 执行一次搜索。空 query 在发出请求前返回 InvalidArgument；其它失败都变成 Failure
    pub async fn search(&self, query: &str) -> Result<SearchResult, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid(Self::NAME, "query must not be empty"));
        }
        tracing::info!(provider = %self.provider.name(), query = %query, "search tool request");
        let result = match self.provider.search(query, &self.options).await {
            Ok(hits) => SearchResult::Success {
                query: query.to_string(),
                hits,
            },
            Err(e) => {
                tracing::warn!(provider = %self.provider.name(), error = %e, "search failed");
                SearchResult::Failure {
                    query: query.to_string(),
                    cause: e.to_string(),
                }
            }
        };
        Ok(result)
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let query = args.get_str("query").unwrap_or("");
        let result = self.search(query).await?;
        let content = truncate_chars(result.render(), self.max_result_chars);
        match result {
            SearchResult::Success { .. } => Ok(content),
            SearchResult::Failure { .. } => Err(ToolError::ExecutionFailed {
                tool: Self::NAME.to_string(),
                cause: content,
            }),
        }
    }
}
