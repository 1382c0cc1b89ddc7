//! 编排器阶段（状态机投影）
//!
//! AwaitingUserInput -> ModelPass1 -> {AnswerReady | ExecutingTools -> ModelPass2 -> AnswerReady}

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    #[default]
    AwaitingUserInput,
    ModelPass1,
    ExecutingTools,
    /// 综合轮：基于工具结果生成最终回答
    ModelPass2,
    AnswerReady,
}

impl AgentPhase {
    pub fn label(&self) -> &'static str {
        match self {
            AgentPhase::AwaitingUserInput => "awaiting input",
            AgentPhase::ModelPass1 => "thinking",
            AgentPhase::ExecutingTools => "executing tools",
            AgentPhase::ModelPass2 => "synthesizing",
            AgentPhase::AnswerReady => "answer ready",
        }
    }
}
