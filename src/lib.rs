//! Forager - 终端联网问答智能体
//!
//! 模块划分：
//! - **agent**: 从配置组装 LLM、搜索工具与编排器
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、阶段、过程事件、system prompt、单轮工具调用编排器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Baseten / Mock）与 ModelGateway
//! - **memory**: 会话转录（Turn / ToolInvocation / ConversationState）
//! - **observability**: 日志初始化
//! - **tools**: 工具注册表、参数 schema、执行器、Web 搜索（Linkup）
//! - **ui**: 终端会话循环与着色输出

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;
pub mod ui;

pub use agent::{create_agent_components, AgentComponents};
pub use core::{AgentError, AgentOrchestrator};
