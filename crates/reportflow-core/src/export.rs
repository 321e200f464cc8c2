//! Export-to-file action
//!
//! Exporting is one-shot and fire-and-forget: the payload is re-decoded and
//! handed to an [`ExportSink`]. Decode and write failures are logged, never
//! returned to the renderer.

use crate::payload::{DecodeError, ReportPayload};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const CSV_MEDIA_TYPE: &str = "text/csv";
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsafe export filename: {0:?}")]
    UnsafeFilename(String),
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for exported reports (the client-side "save as")
pub trait ExportSink: Send + Sync {
    fn save(&self, file: ExportFile) -> Result<(), ExportError>;
}

/// Writes exported reports into a directory
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for `filename`, keeping only its final component.
    fn target_path(&self, filename: &str) -> Result<PathBuf, ExportError> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| ExportError::UnsafeFilename(filename.to_string()))?;
        Ok(self.dir.join(name))
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, file: ExportFile) -> Result<(), ExportError> {
        let path = self.target_path(&file.filename)?;
        let io_err = |source| ExportError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Unique temp file next to the target, then replace it in one step.
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        temp.write_all(&file.bytes).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&path).map_err(|e| io_err(e.error))?;

        tracing::info!(
            path = ?path,
            media_type = file.media_type,
            bytes = file.bytes.len(),
            "report exported"
        );
        Ok(())
    }
}

/// Re-decode `payload` with `decode` and save it through `sink`.
pub(crate) fn export_payload<F>(
    payload: &ReportPayload,
    media_type: &'static str,
    default_filename: &str,
    decode: F,
    sink: &dyn ExportSink,
) where
    F: FnOnce(&ReportPayload) -> Result<Vec<u8>, DecodeError>,
{
    let filename = payload.filename_or(default_filename).to_string();
    let bytes = match decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(%filename, "export skipped, payload could not be decoded: {}", e);
            return;
        }
    };

    let file = ExportFile {
        filename: filename.clone(),
        media_type,
        bytes,
    };
    if let Err(e) = sink.save(file) {
        tracing::error!(%filename, "export failed: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that keeps every saved file in memory
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) files: Mutex<Vec<ExportFile>>,
    }

    impl RecordingSink {
        pub(crate) fn saved(&self) -> Vec<ExportFile> {
            self.files.lock().unwrap().clone()
        }
    }

    impl ExportSink for RecordingSink {
        fn save(&self, file: ExportFile) -> Result<(), ExportError> {
            self.files.lock().unwrap().push(file);
            Ok(())
        }
    }

    #[test]
    fn directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));

        sink.save(ExportFile {
            filename: "sales.csv".to_string(),
            media_type: CSV_MEDIA_TYPE,
            bytes: b"a,b\n1,2".to_vec(),
        })
        .unwrap();

        let written = std::fs::read(dir.path().join("exports").join("sales.csv")).unwrap();
        assert_eq!(written, b"a,b\n1,2");
        let entries = std::fs::read_dir(dir.path().join("exports")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn directory_sink_saves_names_with_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        sink.save(ExportFile {
            filename: "notes.part".to_string(),
            media_type: CSV_MEDIA_TYPE,
            bytes: b"x,y".to_vec(),
        })
        .unwrap();

        assert_eq!(std::fs::read(dir.path().join("notes.part")).unwrap(), b"x,y");
    }

    #[test]
    fn directory_sink_leaves_sibling_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.part"), b"keep me").unwrap();
        std::fs::write(dir.path().join("report.csv"), b"old").unwrap();
        let sink = DirectorySink::new(dir.path());

        sink.save(ExportFile {
            filename: "report.csv".to_string(),
            media_type: CSV_MEDIA_TYPE,
            bytes: b"new".to_vec(),
        })
        .unwrap();
        sink.save(ExportFile {
            filename: "report.pdf".to_string(),
            media_type: PDF_MEDIA_TYPE,
            bytes: b"%PDF".to_vec(),
        })
        .unwrap();

        assert_eq!(std::fs::read(dir.path().join("report.part")).unwrap(), b"keep me");
        assert_eq!(std::fs::read(dir.path().join("report.csv")).unwrap(), b"new");
        assert_eq!(std::fs::read(dir.path().join("report.pdf")).unwrap(), b"%PDF");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn directory_sink_keeps_only_final_path_component() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        sink.save(ExportFile {
            filename: "../escape/report.pdf".to_string(),
            media_type: PDF_MEDIA_TYPE,
            bytes: vec![1, 2, 3],
        })
        .unwrap();

        assert!(dir.path().join("report.pdf").exists());
        assert!(matches!(
            sink.save(ExportFile {
                filename: "..".to_string(),
                media_type: PDF_MEDIA_TYPE,
                bytes: vec![],
            }),
            Err(ExportError::UnsafeFilename(_))
        ));
    }

    #[test]
    fn export_payload_skips_sink_on_decode_failure() {
        let payload = ReportPayload::parse(r#"{"data":"***"}"#).unwrap();
        let sink = RecordingSink::default();

        export_payload(&payload, CSV_MEDIA_TYPE, "report.csv", |p| p.decode_bytes(), &sink);
        assert!(sink.saved().is_empty());
    }

    #[test]
    fn export_payload_uses_default_filename() {
        let payload = ReportPayload::parse(r#"{"data":"YQ=="}"#).unwrap();
        let sink = RecordingSink::default();

        export_payload(&payload, CSV_MEDIA_TYPE, "report.csv", |p| p.decode_bytes(), &sink);
        assert_eq!(
            sink.saved(),
            vec![ExportFile {
                filename: "report.csv".to_string(),
                media_type: CSV_MEDIA_TYPE,
                bytes: b"a".to_vec(),
            }]
        );
    }
}
