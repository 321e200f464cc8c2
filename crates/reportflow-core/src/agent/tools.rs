//! Tool abstraction and dispatch
//!
//! The host executes tools through this layer. Whatever a tool returns is
//! stored as the invocation's result string; any failure settles the
//! invocation as `error`. Report content itself is produced by the tools,
//! not here.

use crate::invocation::{InvocationStatus, ToolInvocation};
use crate::linkage::{InvocationStore, ResultSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A tool the agent can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as used in tool calls
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(&self, args: Value) -> Result<Value>;
}

/// Runs tool calls by name and settles their invocations in the store
pub struct ToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
    store: Arc<InvocationStore>,
}

impl ToolExecutor {
    pub fn new(store: Arc<InvocationStore>) -> Self {
        Self {
            tools: HashMap::new(),
            store,
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        tracing::debug!(tool = tool.name(), "registered tool: {}", tool.description());
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Execute `invocation` and record its terminal status.
    pub async fn run(&self, invocation: &ToolInvocation, args: Value) -> InvocationStatus {
        let settled = match self.execute(invocation, args).await {
            Ok(result) => self.store.complete(&invocation.id, result),
            Err(e) => {
                tracing::warn!(invocation = %invocation.id, "tool call failed: {:#}", e);
                self.store.fail(&invocation.id)
            }
        };
        if let Err(e) = settled {
            tracing::warn!("{}", e);
        }
        self.store.snapshot(&invocation.id).status
    }

    async fn execute(&self, invocation: &ToolInvocation, args: Value) -> Result<String> {
        let tool = self
            .tools
            .get(&invocation.tool_name)
            .cloned()
            .with_context(|| format!("tool not found: {}", invocation.tool_name))?;

        tracing::info!(invocation = %invocation.id, tool = %invocation.tool_name, "executing tool");
        let value = tool
            .execute(args)
            .await
            .with_context(|| format!("tool {} failed", invocation.tool_name))?;

        match value {
            Value::String(text) => Ok(text),
            other => serde_json::to_string(&other).context("failed to encode tool result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ReportPayload;

    /// Returns a fixed CSV payload
    struct FixedCsvTool;

    #[async_trait]
    impl Tool for FixedCsvTool {
        fn name(&self) -> &str {
            "generate_csv_report"
        }

        fn description(&self) -> &str {
            "Generate a CSV report"
        }

        async fn execute(&self, _args: Value) -> Result<Value> {
            Ok(serde_json::json!({
                "data": "YSxiCjEsMg==",
                "filename": "report.csv",
                "rows": 1,
                "columns": ["a", "b"]
            }))
        }
    }

    struct TitleEchoTool;

    #[async_trait]
    impl Tool for TitleEchoTool {
        fn name(&self) -> &str {
            "generate_pdf_report"
        }

        fn description(&self) -> &str {
            "Echoes report_title, fails without it"
        }

        async fn execute(&self, args: Value) -> Result<Value> {
            let title = args["report_title"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("missing report_title"))?;
            Ok(Value::from(title))
        }
    }

    fn executor() -> (ToolExecutor, Arc<InvocationStore>) {
        let store = Arc::new(InvocationStore::new());
        let mut executor = ToolExecutor::new(Arc::clone(&store));
        executor.register(Arc::new(FixedCsvTool));
        executor.register(Arc::new(TitleEchoTool));
        (executor, store)
    }

    #[test]
    fn registered_tools_are_found_by_name() {
        let (executor, _) = executor();
        assert!(executor.has_tool("generate_csv_report"));
        assert!(executor.has_tool("generate_pdf_report"));
        assert!(!executor.has_tool("search_movies"));
    }

    #[tokio::test]
    async fn successful_tool_completes_with_json_result() {
        let (executor, store) = executor();
        let invocation = ToolInvocation::new("call-1", "generate_csv_report", "msg-1");
        store.register(&invocation);

        let status = executor.run(&invocation, serde_json::json!({})).await;
        assert_eq!(status, InvocationStatus::Completed);

        let result = store.snapshot(&invocation.id).result.unwrap();
        let payload = ReportPayload::parse(&result).unwrap();
        assert_eq!(payload.decode_text().unwrap(), "a,b\n1,2");
    }

    #[tokio::test]
    async fn failing_or_unknown_tool_settles_as_error() {
        let (executor, store) = executor();

        let missing_title = ToolInvocation::new("call-1", "generate_pdf_report", "msg-1");
        store.register(&missing_title);
        assert_eq!(
            executor.run(&missing_title, serde_json::json!({})).await,
            InvocationStatus::Error
        );
        assert!(store.snapshot(&missing_title.id).result.is_none());

        let unknown = ToolInvocation::new("call-2", "search_movies", "msg-1");
        assert_eq!(
            executor.run(&unknown, serde_json::json!({})).await,
            InvocationStatus::Error
        );
    }

    #[tokio::test]
    async fn string_results_are_stored_verbatim() {
        let (executor, store) = executor();
        let invocation = ToolInvocation::new("call-1", "generate_pdf_report", "msg-1");

        let status = executor
            .run(&invocation, serde_json::json!({ "report_title": "{\"data\":\"JVBERg==\"}" }))
            .await;
        assert_eq!(status, InvocationStatus::Completed);
        assert_eq!(
            store.snapshot(&invocation.id).result.as_deref(),
            Some("{\"data\":\"JVBERg==\"}")
        );
    }

    #[tokio::test]
    async fn rerunning_settled_invocation_keeps_first_result() {
        let (executor, store) = executor();
        let invocation = ToolInvocation::new("call-1", "generate_csv_report", "msg-1");
        store.register(&invocation);
        store.fail(&invocation.id).unwrap();

        assert_eq!(
            executor.run(&invocation, serde_json::json!({})).await,
            InvocationStatus::Error
        );
    }
}
