//! Report payload envelope
//!
//! Report tools answer with a JSON string of the form
//! `{ "data": <base64>, "filename": ..., "rows": ..., "columns": [...], "pages": ... }`.
//! The bytes are therefore encoded twice: base64 inside JSON.
//!
//! Decoding is as forgiving as a browser's `atob`: ASCII whitespace anywhere
//! in `data` is ignored and trailing `=` padding is optional.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    /// Base64-encoded file content
    pub data: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub pages: Option<u64>,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("result is not a report payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("report payload carries no data")]
    EmptyData,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("content is not UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl ReportPayload {
    /// Parse the raw result string of a completed invocation.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let payload: ReportPayload = serde_json::from_str(raw)?;
        if payload.data.trim().is_empty() {
            return Err(PayloadError::EmptyData);
        }
        Ok(payload)
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        let compact: Vec<u8> = self
            .data
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        Ok(BASE64.decode(compact)?)
    }

    pub fn decode_text(&self) -> Result<String, DecodeError> {
        Ok(String::from_utf8(self.decode_bytes()?)?)
    }

    /// Filename from the payload, or `default` when absent or blank.
    pub fn filename_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.filename.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => default,
        }
    }
}
