//! Report previews
//!
//! Both previews share the same lifecycle: a surface is mounted while its
//! invocation is still pending, then observes exactly one terminal status.
//! [`PreviewCore`] owns that part; the CSV and PDF renderers only decide what
//! to show once a payload is ready.

pub mod csv;
pub mod pdf;

pub use csv::{CsvPreview, CsvTable, CsvView, TableSummary, TableView};
pub use pdf::{DocumentView, PdfPreview, PdfView, PreviewPane};

use crate::invocation::{InvocationId, InvocationSnapshot, InvocationStatus};
use crate::linkage::Resolver;
use crate::payload::ReportPayload;

pub const FAILED_MESSAGE: &str = "Report generation failed.";
pub const WAITING_MESSAGE: &str = "Waiting for report data...";

/// What a preview can do with the current snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewPhase {
    /// Tool still running
    Pending,
    /// Tool failed; any result content is ignored
    Failed,
    /// Completed, but the result is absent or not a usable payload
    Unusable,
    Ready(ReportPayload),
}

impl PreviewPhase {
    pub fn payload(&self) -> Option<&ReportPayload> {
        match self {
            PreviewPhase::Ready(payload) => Some(payload),
            _ => None,
        }
    }
}

pub fn classify(snapshot: &InvocationSnapshot) -> PreviewPhase {
    match snapshot.status {
        InvocationStatus::Pending => PreviewPhase::Pending,
        InvocationStatus::Error => PreviewPhase::Failed,
        InvocationStatus::Completed => {
            let Some(raw) = snapshot.result.as_deref() else {
                return PreviewPhase::Unusable;
            };
            match ReportPayload::parse(raw) {
                Ok(payload) => PreviewPhase::Ready(payload),
                Err(e) => {
                    tracing::debug!("completed result is not usable: {}", e);
                    PreviewPhase::Unusable
                }
            }
        }
    }
}

/// Records the snapshots a renderer has observed
///
/// Once a terminal snapshot is recorded it is kept; later notifications that
/// disagree with it are logged and dropped.
#[derive(Debug, Default)]
pub struct StatusTracker {
    observed: Option<InvocationSnapshot>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest snapshot. Returns `true` when the tracked state changed.
    pub fn observe(&mut self, id: &InvocationId, snapshot: InvocationSnapshot) -> bool {
        match &self.observed {
            Some(current) if current.status.is_terminal() => {
                if current.status != snapshot.status || current.result != snapshot.result {
                    tracing::warn!(
                        invocation = %id,
                        settled = %current.status,
                        received = %snapshot.status,
                        "dropping notification for settled invocation"
                    );
                }
                false
            }
            Some(current) if current.status == snapshot.status => false,
            _ => {
                tracing::debug!(invocation = %id, status = %snapshot.status, "status observed");
                self.observed = Some(snapshot);
                true
            }
        }
    }

    pub fn status(&self) -> InvocationStatus {
        self.observed
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(InvocationStatus::Pending)
    }

    pub fn snapshot(&self) -> Option<&InvocationSnapshot> {
        self.observed.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

/// Shared lifecycle of a preview: resolver, tracker and current phase
pub struct PreviewCore {
    resolver: Resolver,
    tracker: StatusTracker,
    phase: PreviewPhase,
}

impl PreviewCore {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            tracker: StatusTracker::new(),
            phase: PreviewPhase::Pending,
        }
    }

    pub fn id(&self) -> &InvocationId {
        self.resolver.id()
    }

    pub fn status(&self) -> InvocationStatus {
        self.tracker.status()
    }

    /// Pull the latest snapshot and reclassify if it moved the state.
    pub fn refresh(&mut self) -> &PreviewPhase {
        let snapshot = self.resolver.current();
        if self.tracker.observe(self.resolver.id(), snapshot) {
            if let Some(observed) = self.tracker.snapshot() {
                self.phase = classify(observed);
            }
        }
        &self.phase
    }

    pub fn phase(&self) -> &PreviewPhase {
        &self.phase
    }

    /// Wait for the next store notification.
    pub async fn changed(&mut self) -> bool {
        self.resolver.changed().await
    }
}
