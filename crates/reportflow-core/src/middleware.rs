//! Gen-UI middleware
//!
//! Runs after every model turn. For each tool call in the last AI message
//! whose tool is mapped to a UI component, it pushes a UI message with empty
//! props and the tool call id in its metadata, and registers the invocation
//! as pending. The real data reaches the surface later through the linkage
//! store, keyed by that id.

use crate::context::RuntimeContext;
use crate::invocation::{InvocationId, ToolInvocation};
use crate::linkage::InvocationStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const UI_EVENT: &str = "ui";

/// Component a tool's calls are rendered with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolGenUi {
    pub component_name: String,
}

impl ToolGenUi {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Ai,
    Human,
    Tool,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    #[serde(default)]
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMetadata {
    pub tool_call_id: InvocationId,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiMessage {
    pub id: Uuid,
    /// Component kind, e.g. `csv_preview`
    pub name: String,
    pub props: Map<String, Value>,
    pub metadata: UiMetadata,
}

pub struct GenUiMiddleware {
    tool_to_genui: HashMap<String, ToolGenUi>,
    store: Arc<InvocationStore>,
    ctx: Arc<dyn RuntimeContext>,
}

impl GenUiMiddleware {
    pub fn new(
        tool_to_genui: HashMap<String, ToolGenUi>,
        store: Arc<InvocationStore>,
        ctx: Arc<dyn RuntimeContext>,
    ) -> Self {
        Self {
            tool_to_genui,
            store,
            ctx,
        }
    }

    pub fn component_for(&self, tool_name: &str) -> Option<&str> {
        self.tool_to_genui
            .get(tool_name)
            .map(|genui| genui.component_name.as_str())
    }

    /// Push UI messages for the mapped tool calls of `last_message`.
    pub fn after_model(&self, last_message: &AgentMessage) -> Vec<UiMessage> {
        if last_message.role != MessageRole::Ai {
            return Vec::new();
        }

        let mut pushed = Vec::new();
        for tool_call in &last_message.tool_calls {
            let Some(component_name) = self.component_for(&tool_call.name) else {
                continue;
            };

            let invocation =
                ToolInvocation::new(tool_call.id.as_str(), &tool_call.name, &last_message.id);
            self.store.register(&invocation);

            let message = UiMessage {
                id: Uuid::new_v4(),
                name: component_name.to_string(),
                props: Map::new(),
                metadata: UiMetadata {
                    tool_call_id: invocation.id,
                    message_id: last_message.id.clone(),
                },
            };

            match serde_json::to_value(&message) {
                Ok(payload) => {
                    if let Err(e) = self.ctx.emit(UI_EVENT, payload) {
                        tracing::warn!(tool_call = %tool_call.id, "failed to emit ui message: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!(tool_call = %tool_call.id, "failed to encode ui message: {}", e)
                }
            }
            tracing::debug!(
                tool_call = %tool_call.id,
                component = %message.name,
                "pushed ui message"
            );
            pushed.push(message);
        }
        pushed
    }
}

/// Merge `incoming` into `existing`: same id replaces, new ids append.
pub fn reduce_ui_messages(existing: &mut Vec<UiMessage>, incoming: Vec<UiMessage>) {
    for message in incoming {
        match existing.iter_mut().find(|m| m.id == message.id) {
            Some(slot) => *slot = message,
            None => existing.push(message),
        }
    }
}
