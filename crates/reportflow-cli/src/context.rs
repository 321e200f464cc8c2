use anyhow::Result;
use reportflow_core::context::RuntimeContext;
use serde_json::Value;
use std::path::PathBuf;

pub struct CliContext {
    export_dir: PathBuf,
}

impl CliContext {
    pub fn new(export_dir: PathBuf) -> Self {
        Self { export_dir }
    }
}

impl RuntimeContext for CliContext {
    fn export_dir(&self) -> PathBuf {
        self.export_dir.clone()
    }

    fn emit(&self, event: &str, payload: Value) -> Result<()> {
        // stdout carries rendered surfaces only; events go to the log on stderr.
        tracing::info!(event, "{}", payload);
        Ok(())
    }
}
