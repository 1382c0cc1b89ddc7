//! 记忆层：单会话对话转录（仅内存，不持久化）

pub mod conversation;

pub use conversation::{ConversationState, Role, ToolInvocation, TranscriptViolation, Turn};
