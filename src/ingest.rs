use std::path::Path;

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::ImageFormat;
use thiserror::Error;
use tracing::{debug, info};

/// Largest accepted upload, inclusive.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Please select a valid image file.")]
    NotAnImage { mime_type: String },
    #[error("Image size should be less than 5MB.")]
    TooLarge { size: u64, limit: u64 },
    #[error("Could not read the selected image: {0}")]
    Encode(String),
}

/// A file as handed over by the picker: declared type plus raw bytes.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { name: name.into(), mime_type: mime_type.into(), bytes: bytes.into() }
    }

    /// Reads a file from disk, deriving its type from the extension and then the content.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = ImageFormat::from_path(path)
            .or_else(|_| image::guess_format(&bytes))
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        debug!(%name, %mime_type, size = bytes.len(), "Loaded file from disk");
        Ok(Self { name, mime_type, bytes: Bytes::from(bytes) })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An image that passed validation, encoded as a self-contained data URL.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    data_url: String,
    mime_type: String,
    byte_len: u64,
    ingested_at: DateTime<Utc>,
}

impl UploadedImage {
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    pub fn ingested_at(&self) -> DateTime<Utc> {
        self.ingested_at
    }
}

pub fn validate(file: &SelectedFile) -> Result<(), IngestError> {
    if !file.mime_type.starts_with("image/") {
        return Err(IngestError::NotAnImage { mime_type: file.mime_type.clone() });
    }
    if file.size() > MAX_IMAGE_BYTES {
        return Err(IngestError::TooLarge { size: file.size(), limit: MAX_IMAGE_BYTES });
    }
    Ok(())
}

/// Encodes an already validated file. Runs off the async workers since large
/// images take a while to base64.
pub(crate) async fn encode(file: SelectedFile) -> Result<UploadedImage, IngestError> {
    let SelectedFile { name, mime_type, bytes } = file;
    let image = tokio::task::spawn_blocking(move || {
        let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
        UploadedImage {
            data_url: format!("data:{mime_type};base64,{payload}"),
            mime_type,
            byte_len: bytes.len() as u64,
            ingested_at: Utc::now(),
        }
    })
    .await
    .map_err(|e| IngestError::Encode(e.to_string()))?;

    info!("🖼️ Encoded '{}' ({} bytes, {})", name, image.byte_len, image.mime_type);
    Ok(image)
}

pub async fn validate_and_ingest(file: SelectedFile) -> Result<UploadedImage, IngestError> {
    validate(&file)?;
    encode(file).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_of(mime: &str, len: usize) -> SelectedFile {
        SelectedFile::new("photo", mime, vec![0u8; len])
    }

    #[tokio::test]
    async fn rejects_non_image_types() {
        for mime in ["text/plain", "application/pdf", "", "video/mp4", "imagex/png"] {
            let err = validate_and_ingest(file_of(mime, 10)).await.unwrap_err();
            assert_eq!(err, IngestError::NotAnImage { mime_type: mime.to_string() });
        }
    }

    #[tokio::test]
    async fn accepts_exactly_the_ceiling() {
        let image = validate_and_ingest(file_of("image/jpeg", MAX_IMAGE_BYTES as usize)).await.unwrap();
        assert_eq!(image.byte_len(), MAX_IMAGE_BYTES);
    }

    #[test]
    fn rejects_one_byte_over() {
        let err = validate(&file_of("image/jpeg", MAX_IMAGE_BYTES as usize + 1)).unwrap_err();
        assert_eq!(err, IngestError::TooLarge { size: MAX_IMAGE_BYTES + 1, limit: MAX_IMAGE_BYTES });
        assert_eq!(err.to_string(), "Image size should be less than 5MB.");
    }

    #[tokio::test]
    async fn zero_byte_image_is_accepted() {
        let image = validate_and_ingest(file_of("image/png", 0)).await.unwrap();
        assert_eq!(image.data_url(), "data:image/png;base64,");
    }

    #[tokio::test]
    async fn encodes_as_data_url() {
        let file = SelectedFile::new("dot.gif", "image/gif", &b"GIF89a"[..]);
        let image = validate_and_ingest(file).await.unwrap();
        assert_eq!(image.data_url(), "data:image/gif;base64,R0lGODlh");
        assert_eq!(image.mime_type(), "image/gif");
    }

    #[tokio::test]
    async fn from_path_sniffs_content_without_extension() {
        let path = std::env::temp_dir().join(format!("lens-sniff-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").await.unwrap();
        let file = SelectedFile::from_path(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.ok();
        assert_eq!(file.mime_type, "image/png");
    }
}
