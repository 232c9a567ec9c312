//! `multipart/form-data` encoder for the upload endpoints
//! (`/budget/import`, `/kpi/upload`).
//!
//! `ureq` sends raw bytes only, so forms are encoded here.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

#[derive(Debug, Clone, PartialEq)]
struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// An ordered list of text fields and file parts.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    /// Empty form with a timestamp-derived boundary.
    pub fn new() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::with_boundary(&format!("----homehub{nanos:x}"))
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            parts: Vec::new(),
        }
    }

    /// Append a plain text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            filename: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        });
        self
    }

    /// Append a file part from memory.
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: Vec<u8>) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            data,
        });
        self
    }

    /// Append a file part read from disk, guessing the content type from
    /// the extension.
    pub fn file_from_path(self, name: &str, path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = guess_content_type(&filename);
        Ok(self.file(name, &filename, content_type, data))
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Value for the `Content-Type` request header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the body.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quotes(&part.name)
            );
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape_quotes(filename)));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");
            if let Some(ct) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "%22").replace(['\r', '\n'], " ")
}

fn guess_content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => "text/csv",
        "json" => "application/json",
        "txt" => "text/plain",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fields_and_files() {
        let form = MultipartForm::with_boundary("b0")
            .text("account", "checking")
            .file("file", "may.csv", "text/csv", b"date,amount\n".to_vec());
        let body = String::from_utf8(form.encode()).unwrap();

        assert_eq!(
            body,
            "--b0\r\n\
             Content-Disposition: form-data; name=\"account\"\r\n\r\n\
             checking\r\n\
             --b0\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"may.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             date,amount\n\r\n\
             --b0--\r\n"
        );
    }

    #[test]
    fn generated_boundaries_are_prefixed() {
        let form = MultipartForm::new();
        assert!(form.boundary().starts_with("----homehub"));
        assert!(form.is_empty());
    }

    #[test]
    fn content_type_guess_by_extension() {
        assert_eq!(guess_content_type("kpi.JSON"), "application/json");
        assert_eq!(guess_content_type("ledger.csv"), "text/csv");
        assert_eq!(guess_content_type("blob"), "application/octet-stream");
    }
}
