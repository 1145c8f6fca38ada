//! File store port
//!
//! Agent-created files are opaque blobs; the core only records and looks
//! up their metadata as [`Attachment`]s.

use async_trait::async_trait;
use polis_domain::Attachment;
use thiserror::Error;

/// Errors that can occur during file store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileStoreError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Invalid file URL: {0}")]
    InvalidUrl(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid base64 content: {0}")]
    InvalidEncoding(String),

    #[error("File is not text: {0}")]
    NotText(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[async_trait]
pub trait FileStorePort: Send + Sync {
    async fn create_text_file(&self, filename: &str, content: &str)
    -> Result<Attachment, FileStoreError>;

    /// Store base64 image data. A `data:<type>;base64,` header is accepted.
    async fn create_image_file(
        &self,
        filename: &str,
        base64_content: &str,
    ) -> Result<Attachment, FileStoreError>;

    /// Metadata of the file behind an `/uploads/<name>` URL.
    async fn get_file(&self, file_url: &str) -> Result<Attachment, FileStoreError>;

    /// Contents of a text file behind an `/uploads/<name>` URL.
    async fn read_text(&self, file_url: &str) -> Result<String, FileStoreError>;

    /// Names of all stored files, sorted.
    async fn list_files(&self) -> Result<Vec<String>, FileStoreError>;
}
