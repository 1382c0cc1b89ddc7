//! 核心编排层：错误、阶段、过程事件、system prompt、单轮工具调用状态机

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod prompt;
pub mod state;

pub use error::{AgentError, ToolError};
pub use events::AgentEvent;
pub use orchestrator::AgentOrchestrator;
pub use prompt::{system_prompt_for_today, SearchNudge, DEFAULT_SYSTEM_PROMPT};
pub use state::AgentPhase;
