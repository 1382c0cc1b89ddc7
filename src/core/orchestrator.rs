//! Agent 编排器：单轮工具调用状态机
//!
//! handle_turn：追加 user Turn -> 第一轮模型调用 ->
//! Direct 则直接返回；ToolRequested 则按顺序执行每个工具调用并写回 tool Turn ->
//! 第二轮（综合）模型调用 -> 追加最终 assistant Turn。
//! 每轮最多两次模型调用；模型错误对本轮致命，工具错误只作为会话内容。

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::core::{AgentError, AgentEvent, AgentPhase, SearchNudge};
use crate::llm::{ModelGateway, ModelResponse};
use crate::memory::{ConversationState, ToolInvocation, Turn};
use crate::tools::ToolExecutor;

/// 工具结果预览最大字符数
const RESULT_PREVIEW_CHARS: usize = 200;

/// 单会话编排器：独占 ConversationState，注册表可跨会话共享
pub struct AgentOrchestrator {
    gateway: ModelGateway,
    executor: ToolExecutor,
    conversation: ConversationState,
    phase: AgentPhase,
    nudge: SearchNudge,
    /// 发给模型的最近用户轮数，0 表示不限制
    max_context_turns: usize,
    event_tx: Option<mpsc::UnboundedSender<AgentEvent>>,
    session_id: String,
}

impl AgentOrchestrator {
    pub fn new(gateway: ModelGateway, executor: ToolExecutor) -> Self {
        Self {
            gateway,
            executor,
            conversation: ConversationState::new(),
            phase: AgentPhase::AwaitingUserInput,
            nudge: SearchNudge::disabled(),
            max_context_turns: 0,
            event_tx: None,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_search_nudge(mut self, nudge: SearchNudge) -> Self {
        self.nudge = nudge;
        self
    }

    pub fn with_max_context_turns(mut self, turns: usize) -> Self {
        self.max_context_turns = turns;
        self
    }

    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 当前会话转录（只读，供展示）
    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// 清空会话（开始新会话）
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.phase = AgentPhase::AwaitingUserInput;
        self.session_id = uuid::Uuid::new_v4().to_string();
    }

    fn send_event(&self, ev: AgentEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ev);
        }
    }

    fn set_phase(&mut self, phase: AgentPhase) {
        tracing::debug!(from = self.phase.label(), to = phase.label(), "phase");
        self.phase = phase;
    }

    /// 处理一条用户输入，返回最终回答；致命错误时已写入的转录保持不变
    pub async fn handle_turn(&mut self, user_text: &str) -> Result<String, AgentError> {
        if user_text.trim().is_empty() {
            return Err(AgentError::EmptyInput);
        }
        let span = tracing::info_span!("turn", session = %self.session_id);
        let result = self.run_turn(user_text).instrument(span).await;

        match &result {
            Ok(text) => {
                self.set_phase(AgentPhase::AnswerReady);
                self.send_event(AgentEvent::Answer { text: text.clone() });
            }
            Err(e) => {
                tracing::warn!(error = %e, "turn failed");
                self.set_phase(AgentPhase::AwaitingUserInput);
                self.send_event(AgentEvent::Error { text: e.to_string() });
            }
        }
        debug_assert!(self.conversation.validate().is_ok());
        result
    }

    async fn run_turn(&mut self, user_text: &str) -> Result<String, AgentError> {
        self.conversation.push(Turn::user(user_text));
        let tools = self.executor.schemas();
        let directive = self.nudge.directive_for(user_text);

        self.set_phase(AgentPhase::ModelPass1);
        self.send_event(AgentEvent::Thinking { pass: 1 });
        let first = self
            .gateway
            .converse_with_directive(
                self.conversation.window(self.max_context_turns),
                &tools,
                directive,
            )
            .await?;

        let (invocations, text) = match first {
            ModelResponse::Direct(text) => {
                self.conversation.push(Turn::assistant(text.clone()));
                return Ok(text);
            }
            ModelResponse::ToolRequested { invocations, text } => {
                (normalize_ids(invocations), text)
            }
        };

        tracing::info!(count = invocations.len(), "tool call detected");
        self.conversation.push(Turn::assistant_with_tools(
            text.unwrap_or_default(),
            invocations.clone(),
        ));

        // 按收到的顺序逐个执行，后面的结果可能依赖前面的上下文
        self.set_phase(AgentPhase::ExecutingTools);
        for inv in &invocations {
            self.send_event(AgentEvent::ToolCall {
                id: inv.id.clone(),
                tool: inv.name.clone(),
                arguments: inv.arguments.clone(),
            });
            let outcome = self.executor.run(inv).await;
            self.send_event(AgentEvent::ToolResult {
                id: inv.id.clone(),
                tool: inv.name.clone(),
                ok: outcome.ok,
                preview: preview(&outcome.content),
            });
            self.conversation
                .push(Turn::tool_result(inv.id.clone(), outcome.content));
        }

        // 综合轮不再声明工具：每轮最多一次工具调用
        self.set_phase(AgentPhase::ModelPass2);
        self.send_event(AgentEvent::Thinking { pass: 2 });
        let second = self
            .gateway
            .converse(self.conversation.window(self.max_context_turns), &[])
            .await?;

        let answer = match second {
            ModelResponse::Direct(text) => text,
            ModelResponse::ToolRequested {
                invocations,
                text: Some(text),
            } => {
                tracing::warn!(
                    dropped = invocations.len(),
                    "second pass requested tools, keeping text only"
                );
                text
            }
            ModelResponse::ToolRequested { text: None, .. } => {
                return Err(AgentError::UnexpectedSecondRoundToolRequest);
            }
        };
        self.conversation.push(Turn::assistant(answer.clone()));
        Ok(answer)
    }
}

/// 空或重复的调用 id 替换为新 id，保证 tool Turn 能唯一对应
fn normalize_ids(invocations: Vec<ToolInvocation>) -> Vec<ToolInvocation> {
    let mut seen = HashSet::new();
    invocations
        .into_iter()
        .map(|mut inv| {
            if inv.id.is_empty() || !seen.insert(inv.id.clone()) {
                inv.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                seen.insert(inv.id.clone());
            }
            inv
        })
        .collect()
}

fn preview(content: &str) -> String {
    if content.chars().count() > RESULT_PREVIEW_CHARS {
        format!(
            "{}...",
            content.chars().take(RESULT_PREVIEW_CHARS).collect::<String>()
        )
    } else {
        content.to_string()
    }
}
