use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::period::{PeriodKey, PeriodSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Uploaded,
}

/// A file the backend holds for one entity and period.
///
/// Rebuilt from the server listing on every fetch; never stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub file_name: String,
    pub period: PeriodKey,
    pub status: DocumentStatus,
}

impl UploadedDocument {
    pub fn from_listing(file_name: impl Into<String>, period: PeriodKey) -> Self {
        Self {
            file_name: file_name.into(),
            period,
            status: DocumentStatus::Uploaded,
        }
    }
}

/// Form fields sent next to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub year: String,
    pub month: String,
    pub description: String,
}

impl UploadMetadata {
    pub fn for_selection(selection: &PeriodSelection, description: impl Into<String>) -> Self {
        Self {
            year: format!("{:04}", selection.year()),
            month: selection.month().to_string(),
            description: description.into(),
        }
    }
}

/// File contents ready for a multipart upload.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a local file, guessing its MIME type from the extension. Paths
    /// containing `..` are rejected.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let upload = Self::new(file_name, bytes);
        Ok(match mime_guess::from_path(path).first() {
            Some(mime) => upload.with_content_type(mime.essence_str()),
            None => upload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_listing() {
        let doc = UploadedDocument::from_listing("timesheet.pdf", PeriodKey::new(2025, 3));
        assert_eq!(doc.status, DocumentStatus::Uploaded);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"fileName": "timesheet.pdf", "period": "2025-W3", "status": "Uploaded"})
        );
    }

    #[test]
    fn test_upload_metadata_for_selection() {
        let selection = PeriodSelection::new("2025", "march", 2).unwrap();
        let meta = UploadMetadata::for_selection(&selection, "Week two");
        assert_eq!(meta.year, "2025");
        assert_eq!(meta.month, "March");
        assert_eq!(meta.description, "Week two");
    }

    #[test]
    fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stub.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let upload = DocumentUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "stub.pdf");
        assert_eq!(upload.bytes, b"%PDF");
        assert_eq!(upload.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn test_upload_from_path_without_known_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes");
        std::fs::write(&path, b"hello").unwrap();
        let upload = DocumentUpload::from_path(&path).unwrap();
        assert_eq!(upload.content_type, None);
    }

    #[test]
    fn test_upload_from_path_rejects_parent_components() {
        let err = DocumentUpload::from_path(Path::new("../etc/passwd")).unwrap_err();
        assert!(err.to_string().contains("Invalid input"));
    }
}
