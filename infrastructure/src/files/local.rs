//! Uploads directory on the local filesystem.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use polis_application::ports::file_store::{FileStoreError, FileStorePort};
use polis_domain::{Attachment, UPLOADS_URL_PREFIX};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum file size returned by `read_text` (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// [`FileStorePort`] writing flat files under one uploads directory.
///
/// Files are addressed as `/uploads/<name>`. Names may not contain path
/// separators, so nothing is written outside the directory.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Use `root` as the uploads directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, FileStoreError> {
        let name = filename.trim();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return Err(FileStoreError::InvalidName(filename.to_string()));
        }
        Ok(self.root.join(name))
    }

    fn name_from_url<'a>(&self, file_url: &'a str) -> Result<&'a str, FileStoreError> {
        // Absolute URLs like http://host/uploads/x are accepted too.
        let name = file_url
            .rfind(UPLOADS_URL_PREFIX)
            .map(|i| &file_url[i + UPLOADS_URL_PREFIX.len()..])
            .ok_or_else(|| FileStoreError::InvalidUrl(file_url.to_string()))?;
        if name.is_empty() {
            return Err(FileStoreError::InvalidUrl(file_url.to_string()));
        }
        Ok(name)
    }

    async fn write(&self, filename: &str, bytes: &[u8]) -> Result<Attachment, FileStoreError> {
        let path = self.path_for(filename)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(&path, e))?;
        debug!("Stored {} ({} bytes)", path.display(), bytes.len());
        Ok(Attachment::uploaded(filename.trim(), bytes.len() as u64))
    }

    async fn stat(&self, file_url: &str) -> Result<(PathBuf, Attachment), FileStoreError> {
        let name = self.name_from_url(file_url)?;
        let path = self.path_for(name)?;
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FileStoreError::NotFound(name.to_string()),
            _ => io_error(&path, e),
        })?;
        if !metadata.is_file() {
            return Err(FileStoreError::NotFound(name.to_string()));
        }
        Ok((path, Attachment::uploaded(name, metadata.len())))
    }
}

#[async_trait]
impl FileStorePort for LocalFileStore {
    async fn create_text_file(
        &self,
        filename: &str,
        content: &str,
    ) -> Result<Attachment, FileStoreError> {
        self.write(filename, content.as_bytes()).await
    }

    async fn create_image_file(
        &self,
        filename: &str,
        base64_content: &str,
    ) -> Result<Attachment, FileStoreError> {
        let bytes = decode_base64(base64_content)?;
        self.write(filename, &bytes).await
    }

    async fn get_file(&self, file_url: &str) -> Result<Attachment, FileStoreError> {
        let (_, attachment) = self.stat(file_url).await?;
        Ok(attachment)
    }

    async fn read_text(&self, file_url: &str) -> Result<String, FileStoreError> {
        let (path, attachment) = self.stat(file_url).await?;
        if attachment.size > MAX_READ_SIZE {
            return Err(FileStoreError::NotText(format!(
                "{} is too large ({} bytes)",
                attachment.name, attachment.size
            )));
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        String::from_utf8(bytes).map_err(|_| FileStoreError::NotText(attachment.name))
    }

    async fn list_files(&self) -> Result<Vec<String>, FileStoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| io_error(&self.root, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.root, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file && let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Decode base64, dropping a `data:<type>;base64,` header if present.
fn decode_base64(content: &str) -> Result<Vec<u8>, FileStoreError> {
    let payload = match content.split_once(";base64,") {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => content,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| FileStoreError::InvalidEncoding(e.to_string()))
}

fn io_error(path: &Path, e: std::io::Error) -> FileStoreError {
    FileStoreError::Io(format!("{}: {}", path.display(), e))
}
