//! Preview configuration
//!
//! Loaded from `reportflow.json`; every field has a built-in default, and a
//! missing or unreadable file falls back to the defaults.

use crate::middleware::ToolGenUi;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "reportflow.json";

/// Report tools and the component each one is rendered with
static DEFAULT_COMPONENTS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("generate_csv_report", "csv_preview"),
        ("generate_pdf_report", "pdf_preview"),
    ]
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Data rows shown before the show-all toggle
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_csv_filename")]
    pub csv_default_filename: String,
    #[serde(default = "default_pdf_filename")]
    pub pdf_default_filename: String,
    /// Tool name -> UI component
    #[serde(default = "default_components")]
    pub components: HashMap<String, ToolGenUi>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

fn default_preview_rows() -> usize { 5 }
fn default_csv_filename() -> String { "report.csv".to_string() }
fn default_pdf_filename() -> String { "report.pdf".to_string() }

fn default_components() -> HashMap<String, ToolGenUi> {
    DEFAULT_COMPONENTS
        .iter()
        .map(|(tool, component)| (tool.to_string(), ToolGenUi::new(*component)))
        .collect()
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
            csv_default_filename: default_csv_filename(),
            pdf_default_filename: default_pdf_filename(),
            components: default_components(),
            export_dir: None,
        }
    }
}

impl PreviewConfig {
    /// Configured export directory, else the user's download directory.
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Load configuration from `path`, falling back to defaults.
///
/// `path` may name the file itself or a directory containing
/// `reportflow.json`.
pub fn load_config(path: Option<&Path>) -> PreviewConfig {
    let Some(path) = path else {
        tracing::info!("no config path given, using default preview config");
        return PreviewConfig::default();
    };

    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    if !config_path.exists() {
        tracing::info!("{:?} does not exist, using default preview config", config_path);
        return PreviewConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str::<PreviewConfig>(&content) {
            Ok(config) => {
                tracing::info!("loaded preview config from {:?}", config_path);
                config
            }
            Err(e) => {
                tracing::warn!("failed to parse {:?}: {}, using defaults", config_path, e);
                PreviewConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("failed to read {:?}: {}, using defaults", config_path, e);
            PreviewConfig::default()
        }
    }
}
