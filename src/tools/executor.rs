//! 工具执行器
//!
//! 对单个 ToolInvocation 依次做：按名解析 -> 参数解码校验 -> 执行。
//! 任何一步失败都转为 tool 结果文本（会话数据），不会中断当前轮；每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::Instant;

use crate::core::ToolError;
use crate::memory::ToolInvocation;
use crate::tools::{ToolRegistry, ToolSchema};

/// 单次工具调用的结果：写入 tool Turn 的内容与是否成功
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub content: String,
    pub ok: bool,
}

/// 工具执行器：持有共享的只读注册表
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.registry.schemas()
    }

    async fn try_run(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        let tool = self.registry.resolve(&invocation.name)?;
        let args = tool.schema().decode(&invocation.arguments)?;
        tool.execute(args).await
    }

    /// 执行一次调用；失败时 content 为错误描述（如 "Unknown tool: xxx"）
    pub async fn run(&self, invocation: &ToolInvocation) -> ToolOutcome {
        let start = Instant::now();
        let result = self.try_run(invocation).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ToolError::UnknownTool(_)) => "unknown_tool",
            Err(ToolError::MalformedArguments { .. }) => "malformed_arguments",
            Err(ToolError::InvalidArgument { .. }) => "invalid_arguments",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": invocation.name,
            "invocation_id": invocation.id,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(&invocation.arguments),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        match result {
            Ok(content) => ToolOutcome { content, ok: true },
            Err(e) => ToolOutcome {
                content: e.to_string(),
                ok: false,
            },
        }
    }
}

fn args_preview(args: &str) -> String {
    if args.chars().count() > 200 {
        format!("{}...", args.chars().take(200).collect::<String>())
    } else {
        args.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{SearchHits, SearchItem, SearchOptions, SearchProvider, SearchError, SearchTool};
    use async_trait::async_trait;

    struct FixedProvider;

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, query: &str, _options: &SearchOptions) -> Result<SearchHits, SearchError> {
            Ok(SearchHits {
                answer: None,
                items: vec![SearchItem::new("https://example.com", None, format!("about {query}"))],
            })
        }
    }

    fn executor() -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry
            .register(SearchTool::new(Arc::new(FixedProvider), SearchOptions::default(), 8000))
            .unwrap();
        ToolExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_unknown_tool_outcome() {
        let out = executor()
            .run(&ToolInvocation::new("t1", "fetch_page", "{}"))
            .await;
        assert!(!out.ok);
        assert_eq!(out.content, "Unknown tool: fetch_page");
    }

    #[tokio::test]
    async fn test_malformed_arguments_outcome() {
        let out = executor()
            .run(&ToolInvocation::new("t1", "search_web", "{query:"))
            .await;
        assert!(!out.ok);
        assert!(out.content.starts_with("Malformed arguments for search_web"));
    }

    #[tokio::test]
    async fn test_empty_query_outcome() {
        let out = executor()
            .run(&ToolInvocation::new("t1", "search_web", r#"{"query": "  "}"#))
            .await;
        assert!(!out.ok);
        assert!(out.content.contains("query must not be empty"));
    }

    #[tokio::test]
    async fn test_successful_outcome() {
        let out = executor()
            .run(&ToolInvocation::new("t1", "search_web", r#"{"query": "rust"}"#))
            .await;
        assert!(out.ok);
        assert!(out.content.contains("about rust"));
    }

    #[test]
    fn test_args_preview_truncates() {
        let long = "x".repeat(300);
        assert_eq!(args_preview(&long).len(), 203);
    }
}
