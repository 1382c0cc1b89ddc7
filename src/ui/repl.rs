//! 会话循环：读取输入 -> 交给编排器 -> 输出回答
//!
//! quit / exit 退出，/clear 清空会话，/history 查看转录，/usage 查看 token 统计。
//! Ctrl-C（提示符处或回合内）结束会话，已写入的转录不受影响。
//! stdin 在独立线程上按行读取并经 channel 转发：阻塞中的读不可取消，不能让它拖住 runtime 退出。

use std::future::Future;
use std::io::{BufRead, Write};

use tokio::sync::mpsc;

use crate::agent::AgentComponents;
use crate::core::{AgentError, AgentEvent, AgentOrchestrator};
use crate::ui::render::{render_answer, render_error, render_event, render_transcript};

/// 一行输入对应的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Clear,
    History,
    Usage,
    Ask(String),
    /// 空行，不交给编排器
    Skip,
}

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    /// 输入流结束（EOF）
    Eof,
    Interrupted,
}

pub fn parse_input(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => ReplCommand::Skip,
        "quit" | "exit" | "/quit" | "/exit" => ReplCommand::Quit,
        "/clear" => ReplCommand::Clear,
        "/history" => ReplCommand::History,
        "/usage" => ReplCommand::Usage,
        _ => ReplCommand::Ask(trimmed.to_string()),
    }
}

/// 在独立线程上逐行读取，读到 EOF 或接收端关闭时线程退出
pub fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("forager-stdin".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        // tx 随闭包一起丢弃，接收端立即看到 EOF
        tracing::warn!(error = %e, "failed to spawn input reader");
    }
    rx
}

/// Ctrl-C 信号；监听失败时永不完成，而不是立刻当作中断
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn print_pending(rx: &mut mpsc::UnboundedReceiver<AgentEvent>) {
    while let Ok(ev) = rx.try_recv() {
        if let Some(line) = render_event(&ev) {
            println!("{line}");
        }
    }
}

/// 跑一轮，期间实时输出过程事件；interrupt 先完成时返回 None
async fn drive_turn(
    orchestrator: &mut AgentOrchestrator,
    rx: &mut mpsc::UnboundedReceiver<AgentEvent>,
    text: &str,
    interrupt: impl Future<Output = ()>,
) -> Option<Result<String, AgentError>> {
    let turn = orchestrator.handle_turn(text);
    tokio::pin!(turn);
    tokio::pin!(interrupt);
    let result = loop {
        tokio::select! {
            biased;
            Some(ev) = rx.recv() => {
                if let Some(line) = render_event(&ev) {
                    println!("{line}");
                }
            }
            res = &mut turn => break res,
            _ = &mut interrupt => return None,
        }
    };
    print_pending(rx);
    Some(result)
}

/// 单次问答（非交互模式）
pub async fn run_once(components: &AgentComponents, question: &str) -> Result<String, AgentError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut orchestrator = components.new_session().with_event_sender(tx);
    match drive_turn(&mut orchestrator, &mut rx, question, ctrl_c()).await {
        Some(result) => result,
        None => Err(AgentError::Interrupted),
    }
}

/// 会话主循环：lines 为输入行，interrupt 每次等待时生成一个中断 future
pub async fn run_session<F, Fut>(
    orchestrator: &mut AgentOrchestrator,
    events: &mut mpsc::UnboundedReceiver<AgentEvent>,
    lines: &mut mpsc::UnboundedReceiver<String>,
    interrupt: F,
) -> anyhow::Result<SessionEnd>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.recv() => line,
            _ = interrupt() => {
                println!("\nInterrupted.");
                return Ok(SessionEnd::Interrupted);
            }
        };
        let Some(line) = line else {
            println!();
            return Ok(SessionEnd::Eof);
        };

        match parse_input(&line) {
            ReplCommand::Skip => continue,
            ReplCommand::Quit => {
                println!("Goodbye!");
                return Ok(SessionEnd::Quit);
            }
            ReplCommand::Clear => {
                orchestrator.reset();
                println!("Conversation cleared.\n");
            }
            ReplCommand::History => {
                println!("{}", render_transcript(orchestrator.conversation()));
            }
            ReplCommand::Usage => {
                let (prompt, completion, total) = orchestrator.gateway().token_usage();
                println!("Tokens: prompt {prompt}, completion {completion}, total {total}\n");
            }
            ReplCommand::Ask(text) => match drive_turn(orchestrator, events, &text, interrupt()).await {
                Some(Ok(answer)) => println!("{}", render_answer(&answer)),
                Some(Err(e)) => println!("{}\n", render_error(&e.to_string())),
                None => {
                    println!("\nInterrupted.");
                    return Ok(SessionEnd::Interrupted);
                }
            },
        }
    }
}

/// 交互式会话：stdin + Ctrl-C
pub async fn run_repl(components: &AgentComponents, title: &str) -> anyhow::Result<()> {
    let (tx, mut events) = mpsc::unbounded_channel();
    let mut orchestrator = components.new_session().with_event_sender(tx);
    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));

    println!("--- {title} ---");
    println!("Type 'quit' to exit.\n");

    let end = run_session(&mut orchestrator, &mut events, &mut lines, ctrl_c).await?;
    tracing::info!(
        session = %orchestrator.session_id(),
        turns = orchestrator.conversation().len(),
        end = ?end,
        "session ended"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::llm::{LlmReply, MockLlmClient, ModelGateway};
    use crate::tools::{ToolExecutor, ToolRegistry};

    /// 永远读不到数据的输入（模拟终端上无人输入）
    struct Stalled;

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            loop {
                std::thread::park();
            }
        }
    }

    fn session(llm: Arc<MockLlmClient>) -> (AgentOrchestrator, mpsc::UnboundedReceiver<AgentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = AgentOrchestrator::new(
            ModelGateway::new(llm, ""),
            ToolExecutor::new(Arc::new(ToolRegistry::new())),
        )
        .with_event_sender(tx);
        (orchestrator, rx)
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  "), ReplCommand::Skip);
        assert_eq!(parse_input("QUIT"), ReplCommand::Quit);
        assert_eq!(parse_input("exit"), ReplCommand::Quit);
        assert_eq!(parse_input("/clear"), ReplCommand::Clear);
        assert_eq!(parse_input("/history"), ReplCommand::History);
        assert_eq!(
            parse_input("  What is the capital of France? "),
            ReplCommand::Ask("What is the capital of France?".to_string())
        );
    }

    #[test]
    fn test_interrupt_at_prompt_does_not_hang_shutdown() {
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let end = rt.block_on(async {
                let (mut orchestrator, mut events) = session(Arc::new(MockLlmClient::new()));
                let mut lines = spawn_line_reader(std::io::BufReader::new(Stalled));
                run_session(&mut orchestrator, &mut events, &mut lines, || {
                    tokio::time::sleep(Duration::from_millis(50))
                })
                .await
                .unwrap()
            });
            drop(rt);
            let _ = done_tx.send(end);
        });

        let end = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("runtime shutdown blocked by pending input read");
        assert_eq!(end, SessionEnd::Interrupted);
    }

    #[tokio::test]
    async fn test_session_runs_lines_until_quit() {
        let llm = Arc::new(MockLlmClient::with_replies([Ok(LlmReply::text("Paris."))]));
        let (mut orchestrator, mut events) = session(llm.clone());
        let mut lines = spawn_line_reader(Cursor::new(
            "What is the capital of France?\n\nquit\nnever read\n",
        ));

        let end = run_session(&mut orchestrator, &mut events, &mut lines, std::future::pending::<()>)
            .await
            .unwrap();

        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(llm.call_count(), 1);
        assert_eq!(orchestrator.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_session_ends_on_eof_after_clear() {
        let (mut orchestrator, mut events) = session(Arc::new(MockLlmClient::new()));
        let mut lines = spawn_line_reader(Cursor::new("hello\n/clear\n"));

        let end = run_session(&mut orchestrator, &mut events, &mut lines, std::future::pending::<()>)
            .await
            .unwrap();

        assert_eq!(end, SessionEnd::Eof);
        assert!(orchestrator.conversation().is_empty());
    }
}
