//! Tabular (CSV) preview

use super::{PreviewCore, PreviewPhase, FAILED_MESSAGE, WAITING_MESSAGE};
use crate::config::PreviewConfig;
use crate::export::{export_payload, ExportSink, CSV_MEDIA_TYPE};
use crate::invocation::{InvocationId, InvocationStatus};
use crate::linkage::Resolver;
use crate::payload::{DecodeError, ReportPayload};
use std::fmt;

/// Header and data rows decoded from a CSV payload
///
/// Parsing is deliberately naive: lines split on `\n`, cells on every `,`.
/// Quoted fields with embedded commas are not supported, and rows are kept
/// at whatever width they have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(text: &str) -> Self {
        let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());
        let headers = lines.next().map(split_cells).unwrap_or_default();
        let rows = lines.map(split_cells).collect();
        Self { headers, rows }
    }

    pub fn decode(payload: &ReportPayload) -> Result<Self, DecodeError> {
        Ok(Self::parse(&payload.decode_text()?))
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

fn split_cells(line: &str) -> Vec<String> {
    line.split(',').map(|cell| cell.trim().to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSummary {
    pub rows: u64,
    pub columns: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub filename: String,
    pub headers: Vec<String>,
    /// Rows currently shown
    pub rows: Vec<Vec<String>>,
    pub summary: TableSummary,
    /// Rows collapsed behind the show-all toggle
    pub hidden_rows: usize,
    pub show_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvView {
    Pending,
    Failed,
    Unusable,
    /// Payload present but its content could not be decoded
    Unreadable { filename: String },
    Table(TableView),
}

pub struct CsvPreview {
    core: PreviewCore,
    preview_rows: usize,
    default_filename: String,
    show_all: bool,
    table: Option<Result<CsvTable, String>>,
}

impl CsvPreview {
    pub fn new(resolver: Resolver, config: &PreviewConfig) -> Self {
        Self {
            core: PreviewCore::new(resolver),
            preview_rows: config.preview_rows,
            default_filename: config.csv_default_filename.clone(),
            show_all: false,
            table: None,
        }
    }

    pub fn id(&self) -> &InvocationId {
        self.core.id()
    }

    pub fn status(&self) -> InvocationStatus {
        self.core.status()
    }

    pub fn show_all(&self) -> bool {
        self.show_all
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.show_all = show_all;
    }

    pub fn toggle_show_all(&mut self) {
        self.show_all = !self.show_all;
    }

    pub fn view(&mut self) -> CsvView {
        let payload = match self.core.refresh() {
            PreviewPhase::Pending => return CsvView::Pending,
            PreviewPhase::Failed => return CsvView::Failed,
            PreviewPhase::Unusable => return CsvView::Unusable,
            PreviewPhase::Ready(payload) => payload.clone(),
        };
        let filename = payload.filename_or(&self.default_filename).to_string();

        let table = self.table.get_or_insert_with(|| {
            CsvTable::decode(&payload).map_err(|e| {
                tracing::warn!(filename = %filename, "csv content could not be decoded: {}", e);
                e.to_string()
            })
        });
        let table = match table {
            Ok(table) => table,
            Err(_) => return CsvView::Unreadable { filename },
        };

        let summary = TableSummary {
            rows: payload.rows.unwrap_or(table.rows.len() as u64),
            columns: payload
                .columns
                .as_ref()
                .map(|c| c.len() as u64)
                .unwrap_or(table.width() as u64),
        };
        let visible = if self.show_all {
            table.rows.len()
        } else {
            table.rows.len().min(self.preview_rows)
        };

        CsvView::Table(TableView {
            filename,
            headers: table.headers.clone(),
            rows: table.rows[..visible].to_vec(),
            summary,
            hidden_rows: table.rows.len() - visible,
            show_all: self.show_all,
        })
    }

    /// Save the decoded CSV through `sink`. Failures are only logged.
    pub fn export(&mut self, sink: &dyn ExportSink) {
        let Some(payload) = self.core.refresh().payload() else {
            tracing::debug!(invocation = %self.core.id(), "nothing to export yet");
            return;
        };
        export_payload(
            payload,
            CSV_MEDIA_TYPE,
            &self.default_filename,
            |p| Ok(p.decode_text()?.into_bytes()),
            sink,
        );
    }

    pub async fn changed(&mut self) -> bool {
        self.core.changed().await
    }
}

impl fmt::Display for CsvView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvView::Pending => write!(f, "Generating CSV report..."),
            CsvView::Failed => write!(f, "{}", FAILED_MESSAGE),
            CsvView::Unusable => write!(f, "{}", WAITING_MESSAGE),
            CsvView::Unreadable { filename } => {
                write!(f, "{}: table preview unavailable, content could not be read", filename)
            }
            CsvView::Table(table) => {
                writeln!(
                    f,
                    "{} ({} rows x {} columns)",
                    table.filename, table.summary.rows, table.summary.columns
                )?;
                write!(f, "{}", table.headers.join(" | "))?;
                for row in &table.rows {
                    write!(f, "\n{}", row.join(" | "))?;
                }
                if table.hidden_rows > 0 {
                    write!(f, "\n... {} more rows (toggle to show all)", table.hidden_rows)?;
                }
                Ok(())
            }
        }
    }
}
