//! Forager - 终端联网问答智能体
//!
//! 入口：初始化日志、加载配置、创建 Agent 组件并运行会话循环。
//! 带参数运行时（`forager 今天有什么新闻`）只回答一次后退出。

use anyhow::Context;
use forager::{
    agent::create_agent_components,
    config::{load_config, AppConfig},
    llm::LlmClient,
    observability,
    ui::{run_once, run_repl},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let components = create_agent_components(&cfg).context("Failed to create agent")?;

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if !question.trim().is_empty() {
        let answer = run_once(&components, &question)
            .await
            .context("Query failed")?;
        println!("{answer}");
        return Ok(());
    }

    let title = format!(
        "{} (provider: {})",
        cfg.app.name.as_deref().unwrap_or("Forager"),
        components.llm.provider()
    );
    run_repl(&components, &title).await.context("Session failed")?;

    Ok(())
}
