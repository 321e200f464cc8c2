//! Tool invocation model
//!
//! A `ToolInvocation` is created when the agent decides to call a tool and is
//! never mutated afterwards. Its status lives in the linkage store as an
//! `InvocationSnapshot` keyed by the invocation id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier of a single tool call within a conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(String);

impl InvocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvocationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InvocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for InvocationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A tool call the agent decided to make
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: InvocationId,
    pub tool_name: String,
    /// Id of the AI message that carried the tool call
    pub message_id: String,
}

impl ToolInvocation {
    pub fn new(
        id: impl Into<InvocationId>,
        tool_name: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            message_id: message_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Pending,
    Completed,
    Error,
}

impl InvocationStatus {
    /// `Completed` and `Error` are final: no transition leaves them.
    pub fn is_terminal(self) -> bool {
        !matches!(self, InvocationStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvocationStatus::Pending => "pending",
            InvocationStatus::Completed => "completed",
            InvocationStatus::Error => "error",
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest `{status, result}` pair observed for an invocation
///
/// `result` is `None` while pending and on error. When completed it holds
/// the raw JSON string produced by the tool, still base64-encoded inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationSnapshot {
    pub status: InvocationStatus,
    pub result: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl InvocationSnapshot {
    pub fn pending() -> Self {
        Self {
            status: InvocationStatus::Pending,
            result: None,
            updated_at: Utc::now(),
        }
    }

    pub fn completed(result: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::Completed,
            result: Some(result.into()),
            updated_at: Utc::now(),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: InvocationStatus::Error,
            result: None,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!InvocationStatus::Pending.is_terminal());
        assert!(InvocationStatus::Completed.is_terminal());
        assert!(InvocationStatus::Error.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&InvocationStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");

        let parsed: InvocationStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, InvocationStatus::Error);
    }

    #[test]
    fn snapshots_carry_result_only_when_completed() {
        assert!(InvocationSnapshot::pending().result.is_none());
        assert!(InvocationSnapshot::failed().result.is_none());
        assert_eq!(
            InvocationSnapshot::completed("{}").result.as_deref(),
            Some("{}")
        );
    }
}
