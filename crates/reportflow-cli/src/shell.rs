//! Line-oriented UI shell
//!
//! Each input line is one JSON event from the agent runtime. Messages go
//! through the gen-UI middleware and mount surfaces; tool calls run against
//! the registered tools and tool results settle invocations directly; toggle
//! and export act on a mounted surface; unmount drops it. Every handled event
//! returns the rendered text of the surfaces it touched.

use anyhow::{bail, Context, Result};
use reportflow_core::agent::{Tool, ToolExecutor};
use reportflow_core::blob::BlobStore;
use reportflow_core::context::RuntimeContext;
use reportflow_core::export::DirectorySink;
use reportflow_core::middleware::{reduce_ui_messages, AgentMessage, GenUiMiddleware, UiMessage};
use reportflow_core::{
    InvocationId, InvocationStatus, InvocationStore, PreviewConfig, Surface, ToolInvocation,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellEvent {
    Message(AgentMessage),
    ToolCall {
        tool_call_id: InvocationId,
        name: String,
        #[serde(default)]
        args: Value,
    },
    ToolResult {
        tool_call_id: InvocationId,
        status: InvocationStatus,
        #[serde(default)]
        result: Option<Value>,
    },
    Toggle {
        tool_call_id: InvocationId,
    },
    Export {
        tool_call_id: InvocationId,
    },
    Unmount {
        tool_call_id: InvocationId,
    },
}

pub struct Shell {
    config: PreviewConfig,
    store: Arc<InvocationStore>,
    middleware: GenUiMiddleware,
    executor: ToolExecutor,
    blobs: BlobStore,
    sink: DirectorySink,
    ui_messages: Vec<UiMessage>,
    surfaces: Vec<Surface>,
}

impl Shell {
    pub fn new(config: PreviewConfig, ctx: Arc<dyn RuntimeContext>) -> Self {
        let store = Arc::new(InvocationStore::new());
        let sink = DirectorySink::new(ctx.export_dir());
        let middleware = GenUiMiddleware::new(config.components.clone(), Arc::clone(&store), ctx);
        let executor = ToolExecutor::new(Arc::clone(&store));
        Self {
            config,
            store,
            middleware,
            executor,
            blobs: BlobStore::new(),
            sink,
            ui_messages: Vec::new(),
            surfaces: Vec::new(),
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        self.executor.register(tool);
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn ui_messages(&self) -> &[UiMessage] {
        &self.ui_messages
    }

    pub fn store(&self) -> &InvocationStore {
        &self.store
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Vec<String>> {
        let event: ShellEvent = serde_json::from_str(line).context("invalid event line")?;
        self.handle(event).await
    }

    pub async fn handle(&mut self, event: ShellEvent) -> Result<Vec<String>> {
        match event {
            ShellEvent::Message(message) => {
                let mut pushed = self.middleware.after_model(&message);
                // A replayed message must not mount a second surface for the same call.
                pushed.retain(|ui| !self.is_mounted(&ui.metadata.tool_call_id));

                let mut mounted = Vec::new();
                for ui in &pushed {
                    if let Some(surface) =
                        Surface::mount(ui, &*self.store, &self.blobs, &self.config)
                    {
                        mounted.push(surface.id().clone());
                        self.surfaces.push(surface);
                    }
                }
                reduce_ui_messages(&mut self.ui_messages, pushed);
                Ok(mounted.iter().flat_map(|id| self.render(id)).collect())
            }
            ShellEvent::ToolCall {
                tool_call_id,
                name,
                args,
            } => {
                let message_id = self
                    .store
                    .invocation(&tool_call_id)
                    .map(|known| known.message_id)
                    .unwrap_or_default();
                let invocation = ToolInvocation::new(tool_call_id.clone(), name, message_id);
                self.store.register(&invocation);

                let status = self.executor.run(&invocation, args).await;
                tracing::debug!(invocation = %tool_call_id, %status, "tool call finished");
                Ok(self.render(&tool_call_id))
            }
            ShellEvent::ToolResult {
                tool_call_id,
                status,
                result,
            } => {
                let settled = match status {
                    InvocationStatus::Completed => {
                        let raw = match result {
                            Some(Value::String(text)) => text,
                            Some(other) => other.to_string(),
                            None => String::new(),
                        };
                        self.store.complete(&tool_call_id, raw)
                    }
                    InvocationStatus::Error => self.store.fail(&tool_call_id),
                    InvocationStatus::Pending => {
                        bail!("tool_result for {} must carry a terminal status", tool_call_id)
                    }
                };
                if settled.is_err() {
                    return Ok(Vec::new());
                }
                Ok(self.render(&tool_call_id))
            }
            ShellEvent::Toggle { tool_call_id } => {
                find_surface(&mut self.surfaces, &tool_call_id)?.toggle();
                Ok(self.render(&tool_call_id))
            }
            ShellEvent::Export { tool_call_id } => {
                find_surface(&mut self.surfaces, &tool_call_id)?.export(&self.sink);
                Ok(Vec::new())
            }
            ShellEvent::Unmount { tool_call_id } => {
                let before = self.surfaces.len();
                // Dropping a surface releases its preview resources.
                self.surfaces.retain(|surface| surface.id() != &tool_call_id);
                self.ui_messages
                    .retain(|ui| ui.metadata.tool_call_id != tool_call_id);
                let forgotten = self.store.remove(&tool_call_id);

                if before == self.surfaces.len() && !forgotten {
                    bail!("nothing mounted for {}", tool_call_id);
                }
                tracing::debug!(invocation = %tool_call_id, "surface unmounted");
                Ok(Vec::new())
            }
        }
    }

    fn is_mounted(&self, id: &InvocationId) -> bool {
        self.surfaces.iter().any(|surface| surface.id() == id)
    }

    /// Rendered text of every surface bound to `id`.
    fn render(&mut self, id: &InvocationId) -> Vec<String> {
        self.surfaces
            .iter_mut()
            .filter(|surface| surface.id() == id)
            .map(|surface| {
                let view = surface.render();
                format!("[{} {}] {}", surface.kind(), surface.id(), view)
            })
            .collect()
    }
}

fn find_surface<'a>(surfaces: &'a mut [Surface], id: &InvocationId) -> Result<&'a mut Surface> {
    match surfaces.iter_mut().find(|surface| surface.id() == id) {
        Some(surface) => Ok(surface),
        None => bail!("no surface mounted for {}", id),
    }
}
