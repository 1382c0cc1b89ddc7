//! 可观测性：日志输出到 stderr，避免与终端回答交错

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 日志：默认 warn（保持终端整洁），可通过 RUST_LOG 覆盖，如 RUST_LOG=forager=info
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
