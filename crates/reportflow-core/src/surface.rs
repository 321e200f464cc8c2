//! UI surfaces
//!
//! A surface is the mounted renderer for one UI message. It is bound to the
//! invocation named in the message metadata, never to the (empty) props.

use crate::blob::BlobStore;
use crate::config::PreviewConfig;
use crate::export::ExportSink;
use crate::invocation::{InvocationId, InvocationStatus};
use crate::linkage::{Resolver, ResultSource};
use crate::middleware::UiMessage;
use crate::preview::{CsvPreview, CsvView, PdfPreview, PdfView};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    CsvPreview,
    PdfPreview,
}

impl ComponentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "csv_preview" => Some(ComponentKind::CsvPreview),
            "pdf_preview" => Some(ComponentKind::PdfPreview),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::CsvPreview => "csv_preview",
            ComponentKind::PdfPreview => "pdf_preview",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub enum Surface {
    Csv(CsvPreview),
    Pdf(PdfPreview),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceView {
    Csv(CsvView),
    Pdf(PdfView),
}

impl Surface {
    /// Mount the renderer for `message`. Unknown component names yield `None`.
    pub fn mount(
        message: &UiMessage,
        source: &dyn ResultSource,
        blobs: &BlobStore,
        config: &PreviewConfig,
    ) -> Option<Self> {
        let Some(kind) = ComponentKind::from_name(&message.name) else {
            tracing::warn!(component = %message.name, "no renderer for ui component");
            return None;
        };

        let resolver = Resolver::bind(source, message.metadata.tool_call_id.clone());
        let surface = match kind {
            ComponentKind::CsvPreview => Surface::Csv(CsvPreview::new(resolver, config)),
            ComponentKind::PdfPreview => {
                Surface::Pdf(PdfPreview::new(resolver, blobs.clone(), config))
            }
        };
        tracing::debug!(
            invocation = %message.metadata.tool_call_id,
            component = %kind,
            "surface mounted"
        );
        Some(surface)
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Surface::Csv(_) => ComponentKind::CsvPreview,
            Surface::Pdf(_) => ComponentKind::PdfPreview,
        }
    }

    pub fn id(&self) -> &InvocationId {
        match self {
            Surface::Csv(preview) => preview.id(),
            Surface::Pdf(preview) => preview.id(),
        }
    }

    pub fn status(&self) -> InvocationStatus {
        match self {
            Surface::Csv(preview) => preview.status(),
            Surface::Pdf(preview) => preview.status(),
        }
    }

    /// Show-all rows for CSV, open/close the document preview for PDF.
    pub fn toggle(&mut self) {
        match self {
            Surface::Csv(preview) => preview.toggle_show_all(),
            Surface::Pdf(preview) => preview.toggle_preview(),
        }
    }

    pub fn export(&mut self, sink: &dyn ExportSink) {
        match self {
            Surface::Csv(preview) => preview.export(sink),
            Surface::Pdf(preview) => preview.export(sink),
        }
    }

    pub fn render(&mut self) -> SurfaceView {
        match self {
            Surface::Csv(preview) => SurfaceView::Csv(preview.view()),
            Surface::Pdf(preview) => SurfaceView::Pdf(preview.view()),
        }
    }

    pub async fn changed(&mut self) -> bool {
        match self {
            Surface::Csv(preview) => preview.changed().await,
            Surface::Pdf(preview) => preview.changed().await,
        }
    }
}

impl fmt::Display for SurfaceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceView::Csv(view) => fmt::Display::fmt(view, f),
            SurfaceView::Pdf(view) => fmt::Display::fmt(view, f),
        }
    }
}
