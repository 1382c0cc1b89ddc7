//! Linkup 搜索 API 客户端
//!
//! POST {base_url}/search，Bearer 鉴权，body 为 {q, depth, outputType}。
//! searchResults 模式返回 results[]，sourcedAnswer 模式返回 answer + sources[]。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::search::{
    OutputType, SearchDepth, SearchError, SearchHits, SearchItem, SearchOptions, SearchProvider,
};

pub const LINKUP_BASE_URL: &str = "https://api.linkup.so/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkupRequest<'a> {
    q: &'a str,
    depth: SearchDepth,
    output_type: OutputType,
}

#[derive(Debug, Deserialize)]
struct LinkupResult {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkupSource {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: Option<String>,
}

/// 两种输出模式共用一个响应结构，未出现的字段为空
#[derive(Debug, Deserialize, Default)]
struct LinkupResponse {
    #[serde(default)]
    results: Vec<LinkupResult>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    sources: Vec<LinkupSource>,
}

impl LinkupResponse {
    fn into_hits(self, output_type: OutputType) -> SearchHits {
        match output_type {
            OutputType::SearchResults => SearchHits {
                answer: None,
                items: self
                    .results
                    .into_iter()
                    .map(|r| {
                        let mut item =
                            SearchItem::new(r.url, r.name, r.content.unwrap_or_default());
                        if let Some(kind) = r.kind {
                            item.fields.insert("type".to_string(), Value::String(kind));
                        }
                        item
                    })
                    .collect(),
            },
            OutputType::SourcedAnswer => SearchHits {
                // 缺失或空白的 answer 视为没有答案，交给空结果渲染
                answer: self.answer.filter(|a| !a.trim().is_empty()),
                items: self
                    .sources
                    .into_iter()
                    .map(|s| SearchItem {
                        source: s.url,
                        title: s.name,
                        snippet: s.snippet.unwrap_or_default(),
                        fields: Map::new(),
                    })
                    .collect(),
            },
        }
    }
}

/// Linkup 客户端：超时由 reqwest 负责（传输层关注点）
pub struct LinkupClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LinkupClient {
    pub fn new(base_url: Option<&str>, api_key: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("forager/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url
                .unwrap_or(LINKUP_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for LinkupClient {
    fn name(&self) -> &str {
        "linkup"
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchHits, SearchError> {
        let body = LinkupRequest {
            q: query,
            depth: options.depth,
            output_type: options.output_type,
        };
        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Http {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let parsed: LinkupResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        Ok(parsed.into_hits(options.output_type))
    }
}
