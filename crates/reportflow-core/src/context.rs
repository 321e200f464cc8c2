//! Runtime context abstraction for the UI host
//!
//! This module defines the `RuntimeContext` trait that abstracts away the
//! host that displays gen-UI messages, so the middleware can run inside the
//! CLI shell, a test harness, or a future desktop frontend.

use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;

/// Defines the capabilities the middleware and renderers need from the host
pub trait RuntimeContext: Send + Sync {
    /// Directory exported reports are saved to
    ///
    /// CLI: `--export-dir`, the config file, or the download directory
    fn export_dir(&self) -> PathBuf;

    /// Send an event to the UI (if applicable)
    ///
    /// CLI: logs to stderr so stdout carries only rendered output
    fn emit(&self, event: &str, payload: Value) -> Result<()>;
}
