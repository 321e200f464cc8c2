//! ReportFlow Core - tool-call linkage and report previews
//!
//! This crate contains the UI-independent logic that sits between an agent
//! runtime and a generative-UI shell: the keyed store that links tool calls
//! to their eventual results, the CSV/PDF preview renderers, the gen-UI
//! middleware and the tool dispatch boundary. It can be reused across
//! frontends (CLI shell, desktop app, tests).

pub mod agent;
pub mod blob;
pub mod config;
pub mod context;
pub mod export;
pub mod invocation;
pub mod linkage;
pub mod middleware;
pub mod payload;
pub mod preview;
pub mod surface;

pub use config::{load_config, PreviewConfig};
pub use invocation::{InvocationId, InvocationSnapshot, InvocationStatus, ToolInvocation};
pub use linkage::{InvocationStore, LinkageError, Resolver, ResultSource};
pub use surface::{ComponentKind, Surface, SurfaceView};
