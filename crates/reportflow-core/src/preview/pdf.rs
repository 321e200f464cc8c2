//! Binary (PDF) preview
//!
//! The document is only decoded into a blob when the user asks for the
//! preview. The resulting [`ObjectUrl`] is owned by the preview and released
//! when the preview is hidden or the component is dropped.

use super::{PreviewCore, PreviewPhase, FAILED_MESSAGE, WAITING_MESSAGE};
use crate::blob::{Blob, BlobStore, ObjectUrl};
use crate::config::PreviewConfig;
use crate::export::{export_payload, ExportSink, PDF_MEDIA_TYPE};
use crate::invocation::{InvocationId, InvocationStatus};
use crate::linkage::Resolver;
use std::fmt;

pub const PREVIEW_FALLBACK_MESSAGE: &str =
    "Preview not available. Use the download action to open the PDF.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewPane {
    Hidden,
    Visible { url: String, bytes: usize },
    /// Preview was requested but the document could not be decoded
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub filename: String,
    pub pages: Option<u64>,
    pub rows: Option<u64>,
    pub preview: PreviewPane,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfView {
    Pending,
    Failed,
    Unusable,
    Document(DocumentView),
}

enum Pane {
    Hidden,
    Visible(ObjectUrl),
    Fallback,
}

pub struct PdfPreview {
    core: PreviewCore,
    blobs: BlobStore,
    default_filename: String,
    pane: Pane,
}

impl PdfPreview {
    pub fn new(resolver: Resolver, blobs: BlobStore, config: &PreviewConfig) -> Self {
        Self {
            core: PreviewCore::new(resolver),
            blobs,
            default_filename: config.pdf_default_filename.clone(),
            pane: Pane::Hidden,
        }
    }

    pub fn id(&self) -> &InvocationId {
        self.core.id()
    }

    pub fn status(&self) -> InvocationStatus {
        self.core.status()
    }

    pub fn preview_open(&self) -> bool {
        !matches!(self.pane, Pane::Hidden)
    }

    pub fn toggle_preview(&mut self) {
        let open = self.preview_open();
        self.set_preview(!open);
    }

    /// Show or hide the preview. Hiding releases the object URL.
    pub fn set_preview(&mut self, visible: bool) {
        if !visible {
            self.pane = Pane::Hidden;
            return;
        }
        if self.preview_open() {
            return;
        }

        let Some(payload) = self.core.refresh().payload() else {
            tracing::debug!(invocation = %self.core.id(), "preview requested before document is ready");
            return;
        };
        self.pane = match payload.decode_bytes() {
            Ok(bytes) => Pane::Visible(
                self.blobs
                    .create_object_url(Blob::new(PDF_MEDIA_TYPE, bytes)),
            ),
            Err(e) => {
                tracing::warn!(invocation = %self.core.id(), "pdf preview unavailable: {}", e);
                Pane::Fallback
            }
        };
    }

    pub fn view(&mut self) -> PdfView {
        let payload = match self.core.refresh() {
            PreviewPhase::Pending => return PdfView::Pending,
            PreviewPhase::Failed => return PdfView::Failed,
            PreviewPhase::Unusable => return PdfView::Unusable,
            PreviewPhase::Ready(payload) => payload,
        };

        let preview = match &self.pane {
            Pane::Hidden => PreviewPane::Hidden,
            Pane::Visible(url) => PreviewPane::Visible {
                url: url.as_str().to_string(),
                bytes: url.len(),
            },
            Pane::Fallback => PreviewPane::Fallback,
        };

        PdfView::Document(DocumentView {
            filename: payload.filename_or(&self.default_filename).to_string(),
            pages: payload.pages,
            rows: payload.rows,
            preview,
        })
    }

    /// Save the decoded PDF through `sink`. Failures are only logged.
    pub fn export(&mut self, sink: &dyn ExportSink) {
        let Some(payload) = self.core.refresh().payload() else {
            tracing::debug!(invocation = %self.core.id(), "nothing to export yet");
            return;
        };
        export_payload(
            payload,
            PDF_MEDIA_TYPE,
            &self.default_filename,
            |p| p.decode_bytes(),
            sink,
        );
    }

    pub async fn changed(&mut self) -> bool {
        self.core.changed().await
    }
}

impl fmt::Display for PdfView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfView::Pending => write!(f, "Generating PDF report..."),
            PdfView::Failed => write!(f, "{}", FAILED_MESSAGE),
            PdfView::Unusable => write!(f, "{}", WAITING_MESSAGE),
            PdfView::Document(doc) => {
                write!(f, "{}", doc.filename)?;
                match (doc.pages, doc.rows) {
                    (Some(pages), Some(rows)) => write!(f, " ({} pages, {} rows)", pages, rows)?,
                    (Some(pages), None) => write!(f, " ({} pages)", pages)?,
                    (None, Some(rows)) => write!(f, " ({} rows)", rows)?,
                    (None, None) => {}
                }
                match &doc.preview {
                    PreviewPane::Hidden => write!(f, "\npreview hidden (toggle to show)"),
                    PreviewPane::Visible { url, bytes } => {
                        write!(f, "\npreview: {} ({} bytes)", url, bytes)
                    }
                    PreviewPane::Fallback => write!(f, "\n{}", PREVIEW_FALLBACK_MESSAGE),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::RecordingSink;
    use crate::linkage::InvocationStore;
    use crate::preview::tests::{pending_store, report_result};
    use serde_json::json;

    const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF";

    fn mount(store: &InvocationStore, blobs: &BlobStore) -> PdfPreview {
        PdfPreview::new(
            Resolver::bind(store, "call-1".into()),
            blobs.clone(),
            &PreviewConfig::default(),
        )
    }

    fn completed_store() -> InvocationStore {
        let store = pending_store("call-1", "generate_pdf_report");
        store
            .complete(
                &"call-1".into(),
                report_result(PDF_BYTES, json!({ "filename": "sales.pdf", "pages": 1, "rows": 5 })),
            )
            .unwrap();
        store
    }

    fn document(view: PdfView) -> DocumentView {
        match view {
            PdfView::Document(doc) => doc,
            other => panic!("expected document, got {:?}", other),
        }
    }

    #[test]
    fn preview_is_not_built_eagerly() {
        let store = completed_store();
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);

        let doc = document(preview.view());
        assert_eq!(doc.filename, "sales.pdf");
        assert_eq!(doc.pages, Some(1));
        assert_eq!(doc.rows, Some(5));
        assert_eq!(doc.preview, PreviewPane::Hidden);
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn toggle_creates_and_releases_object_url() {
        let store = completed_store();
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);

        preview.toggle_preview();
        let url = match document(preview.view()).preview {
            PreviewPane::Visible { url, bytes } => {
                assert_eq!(bytes, PDF_BYTES.len());
                url
            }
            other => panic!("expected visible preview, got {:?}", other),
        };
        let blob = blobs.resolve(&url).unwrap();
        assert_eq!(blob.media_type(), PDF_MEDIA_TYPE);
        assert_eq!(blob.bytes(), PDF_BYTES);

        preview.toggle_preview();
        assert_eq!(document(preview.view()).preview, PreviewPane::Hidden);
        assert!(blobs.resolve(&url).is_none());
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn repeated_toggle_cycles_leak_nothing() {
        let store = completed_store();
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);

        for _ in 0..10 {
            preview.toggle_preview();
            assert_eq!(blobs.live_count(), 1);
            preview.set_preview(true);
            assert_eq!(blobs.live_count(), 1);
            preview.toggle_preview();
            assert_eq!(blobs.live_count(), 0);
        }
    }

    #[test]
    fn dropping_preview_releases_object_url() {
        let store = completed_store();
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);

        preview.set_preview(true);
        assert_eq!(blobs.live_count(), 1);
        drop(preview);
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn invalid_base64_shows_fallback_and_skips_export() {
        let store = pending_store("call-1", "generate_pdf_report");
        store
            .complete(&"call-1".into(), r#"{"data":"@@@@","pages":1}"#)
            .unwrap();
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);

        preview.toggle_preview();
        let doc = document(preview.view());
        assert_eq!(doc.preview, PreviewPane::Fallback);
        assert_eq!(doc.filename, "report.pdf");
        assert!(PdfView::Document(doc)
            .to_string()
            .ends_with(PREVIEW_FALLBACK_MESSAGE));
        assert_eq!(blobs.live_count(), 0);

        let sink = RecordingSink::default();
        preview.export(&sink);
        assert!(sink.saved().is_empty());

        preview.toggle_preview();
        assert_eq!(document(preview.view()).preview, PreviewPane::Hidden);
    }

    #[test]
    fn preview_before_completion_stays_hidden() {
        let store = pending_store("call-1", "generate_pdf_report");
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);

        preview.toggle_preview();
        assert!(!preview.preview_open());
        assert_eq!(preview.view(), PdfView::Pending);
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn error_status_renders_failure() {
        let store = pending_store("call-1", "generate_pdf_report");
        store.fail(&"call-1".into()).unwrap();
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);

        assert_eq!(preview.view(), PdfView::Failed);
        preview.toggle_preview();
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn export_saves_raw_bytes() {
        let store = completed_store();
        let blobs = BlobStore::new();
        let mut preview = mount(&store, &blobs);
        let sink = RecordingSink::default();

        preview.export(&sink);

        let saved = sink.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].filename, "sales.pdf");
        assert_eq!(saved[0].media_type, PDF_MEDIA_TYPE);
        assert_eq!(saved[0].bytes, PDF_BYTES);
        assert_eq!(blobs.live_count(), 0);
    }
}
