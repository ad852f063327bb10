//! Files moving through the upload pipeline.

use std::path::Path;

use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use serde::{Deserialize, Serialize};
use weaver_common::WeaverError;

/// A file handed over by a drop, paste or picker gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    /// Content type as declared by the gesture source.
    pub content_type: String,
    pub data: Bytes,
}

impl PendingFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, sniffing its content type from the bytes.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, WeaverError> {
        let path = path.as_ref();
        let data = Bytes::from(tokio::fs::read(path).await?);
        let content_type = data
            .sniff_mime_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("file")
            .to_string();
        tracing::debug!(%name, %content_type, len = data.len(), "read file for upload");
        Ok(Self {
            name,
            content_type,
            data,
        })
    }
}

/// Successful transport response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

/// Advisory progress for one upload, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// Completed fraction in `0.0..=1.0`. An empty file counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.loaded as f64 / self.total as f64).min(1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[tokio::test]
    async fn from_path_sniffs_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("pixel.png");
        std::fs::write(&png, PNG_HEADER).unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"\x01\x02\x03").unwrap();

        let file = PendingFile::from_path(&png).await.unwrap();
        assert_eq!(file.name, "pixel.png");
        assert_eq!(file.content_type, "image/png");

        let file = PendingFile::from_path(&txt).await.unwrap();
        assert_eq!(file.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = PendingFile::from_path("/nonexistent/weaver.png")
            .await
            .unwrap_err();
        assert!(matches!(err, WeaverError::Io(_)));
    }

    #[test]
    fn uploaded_file_uses_wire_name() {
        let file: UploadedFile =
            serde_json::from_str(r#"{"fileUrl":"https://cdn.example/a.png"}"#).unwrap();
        assert_eq!(file.file_url, "https://cdn.example/a.png");
    }

    #[test]
    fn progress_fraction() {
        assert_eq!(UploadProgress::new(5, 10).fraction(), 0.5);
        assert_eq!(UploadProgress::new(0, 0).fraction(), 1.0);
    }
}
