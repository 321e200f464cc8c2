//! Agent-side integration: tool dispatch

pub mod tools;

pub use tools::{Tool, ToolExecutor};
