//! 终端层：crossterm 着色输出与会话循环

pub mod render;
pub mod repl;

pub use repl::{run_once, run_repl};
