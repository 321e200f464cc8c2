//! Result linkage - keyed store of invocation status
//!
//! UI surfaces are created with empty props before the tool they describe has
//! run. The only thing a surface knows is its invocation id; this module turns
//! that id into the latest `{status, result}` pair and notifies subscribers
//! when it changes.
//!
//! Each id owns one `tokio::sync::watch` channel. The store keeps the sender,
//! surfaces hold receivers through a [`Resolver`].

use crate::invocation::{InvocationId, InvocationSnapshot, InvocationStatus, ToolInvocation};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkageError {
    #[error("invocation {id} already settled as {status}")]
    AlreadyTerminal {
        id: InvocationId,
        status: InvocationStatus,
    },
}

/// Read-only projection over invocation state, injected into renderers
pub trait ResultSource: Send + Sync {
    /// Latest snapshot for `id`. Unknown ids read as pending.
    fn snapshot(&self, id: &InvocationId) -> InvocationSnapshot;

    /// Receiver that sees every later change for `id`.
    fn subscribe(&self, id: &InvocationId) -> watch::Receiver<InvocationSnapshot>;
}

struct Entry {
    invocation: Option<ToolInvocation>,
    tx: watch::Sender<InvocationSnapshot>,
}

impl Entry {
    fn new(invocation: Option<ToolInvocation>, initial: InvocationSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { invocation, tx }
    }

    fn status(&self) -> InvocationStatus {
        self.tx.borrow().status
    }
}

/// Observable map `invocation id -> latest snapshot`
#[derive(Default)]
pub struct InvocationStore {
    entries: RwLock<HashMap<InvocationId, Entry>>,
}

impl InvocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<InvocationId, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<InvocationId, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new invocation as pending.
    ///
    /// Registering an id that is already known keeps its current state and
    /// only fills in the invocation details if they were missing.
    pub fn register(&self, invocation: &ToolInvocation) {
        let mut entries = self.write();
        match entries.get_mut(&invocation.id) {
            Some(entry) => {
                if entry.invocation.is_none() {
                    entry.invocation = Some(invocation.clone());
                }
                tracing::debug!(
                    invocation = %invocation.id,
                    status = %entry.status(),
                    "invocation already registered"
                );
            }
            None => {
                tracing::debug!(
                    invocation = %invocation.id,
                    tool = %invocation.tool_name,
                    "registered pending invocation"
                );
                entries.insert(
                    invocation.id.clone(),
                    Entry::new(Some(invocation.clone()), InvocationSnapshot::pending()),
                );
            }
        }
    }

    /// Settle `id` as completed with the raw JSON result string.
    pub fn complete(
        &self,
        id: &InvocationId,
        result: impl Into<String>,
    ) -> Result<(), LinkageError> {
        self.settle(id, InvocationSnapshot::completed(result))
    }

    /// Settle `id` as failed.
    pub fn fail(&self, id: &InvocationId) -> Result<(), LinkageError> {
        self.settle(id, InvocationSnapshot::failed())
    }

    fn settle(&self, id: &InvocationId, next: InvocationSnapshot) -> Result<(), LinkageError> {
        let mut entries = self.write();
        match entries.get(id) {
            Some(entry) => {
                let current = entry.status();
                if current.is_terminal() {
                    tracing::warn!(
                        invocation = %id,
                        current = %current,
                        attempted = %next.status,
                        "ignoring second terminal update"
                    );
                    return Err(LinkageError::AlreadyTerminal {
                        id: id.clone(),
                        status: current,
                    });
                }
                tracing::debug!(invocation = %id, status = %next.status, "invocation settled");
                entry.tx.send_replace(next);
            }
            None => {
                tracing::debug!(
                    invocation = %id,
                    status = %next.status,
                    "settled invocation without a registered surface"
                );
                entries.insert(id.clone(), Entry::new(None, next));
            }
        }
        Ok(())
    }

    /// Forget `id`. Resolvers bound to it see their channel close.
    pub fn remove(&self, id: &InvocationId) -> bool {
        let removed = self.write().remove(id).is_some();
        if removed {
            tracing::debug!(invocation = %id, "invocation removed");
        }
        removed
    }

    pub fn invocation(&self, id: &InvocationId) -> Option<ToolInvocation> {
        self.read().get(id).and_then(|entry| entry.invocation.clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl ResultSource for InvocationStore {
    fn snapshot(&self, id: &InvocationId) -> InvocationSnapshot {
        self.read()
            .get(id)
            .map(|entry| entry.tx.borrow().clone())
            .unwrap_or_else(InvocationSnapshot::pending)
    }

    fn subscribe(&self, id: &InvocationId) -> watch::Receiver<InvocationSnapshot> {
        if let Some(entry) = self.read().get(id) {
            return entry.tx.subscribe();
        }

        // Dangling reference: hold a pending slot so a later settle is seen.
        self.write()
            .entry(id.clone())
            .or_insert_with(|| Entry::new(None, InvocationSnapshot::pending()))
            .tx
            .subscribe()
    }
}

/// Per-surface handle binding one invocation id to its subscription
pub struct Resolver {
    id: InvocationId,
    rx: watch::Receiver<InvocationSnapshot>,
}

impl Resolver {
    pub fn bind(source: &dyn ResultSource, id: InvocationId) -> Self {
        let rx = source.subscribe(&id);
        Self { id, rx }
    }

    pub fn id(&self) -> &InvocationId {
        &self.id
    }

    /// Latest snapshot; marks it as seen.
    pub fn current(&mut self) -> InvocationSnapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Whether a notification arrived since the last `current()` call.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next notification. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
