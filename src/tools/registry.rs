//! 工具注册表
//!
//! 所有工具实现 Tool trait（schema / execute），由 ToolRegistry 按名注册与解析。
//! 启动时构建一次，之后只读，可用 Arc 在多个会话间共享。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ToolError;
use crate::tools::{ToolArgs, ToolSchema};

/// 工具 trait：静态 schema（供模型理解）与异步执行（参数已按 schema 校验）
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> &ToolSchema;

    fn name(&self) -> &str {
        &self.schema().name
    }

    /// 执行工具；失败以 ToolError 返回，由调用方转为会话内容
    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError>;
}

/// 工具注册表：保持注册顺序，schemas() 按注册顺序返回
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；重名返回 DuplicateTool
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), ToolError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.index
            .get(name)
            .map(|&i| self.tools[i].clone())
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema().clone()).collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
