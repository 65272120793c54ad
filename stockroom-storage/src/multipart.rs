//! Multipart form data decoding.
//!
//! File fields are spooled to disk as they are decoded, so handlers work
//! with paths instead of buffered payloads; text fields are collected into a
//! map. A spooled file that turns out to be unwanted (say, the request fails
//! validation) is removed with [`SpooledFile::discard`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::Stream;
use mime::Mime;
use tokio::fs;
use tracing::{debug, warn};

use crate::{Result, StorageError};

/// Multipart form data parser.
///
/// Wraps `multer` and spools file fields under the given directory.
pub struct Multipart {
    inner: multer::Multipart<'static>,
    spool_dir: PathBuf,
}

impl Multipart {
    /// Create a new multipart parser from a stream and boundary.
    pub fn new<S>(stream: S, boundary: &str, spool_dir: impl Into<PathBuf>) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Self {
            inner: multer::Multipart::new(stream, boundary),
            spool_dir: spool_dir.into(),
        }
    }

    /// Create from a Content-Type header value and a body stream.
    pub fn from_request<S>(
        content_type: &str,
        body: S,
        spool_dir: impl Into<PathBuf>,
    ) -> Result<Self>
    where
        S: Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + 'static,
    {
        let boundary = multer::parse_boundary(content_type)
            .map_err(|e| StorageError::Multipart(e.to_string()))?;

        Ok(Self::new(body, &boundary, spool_dir))
    }

    /// Create from a fully buffered body.
    pub fn from_bytes(
        content_type: &str,
        body: Bytes,
        spool_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let stream = futures::stream::once(futures::future::ready(Ok::<_, std::io::Error>(body)));
        Self::from_request(content_type, stream, spool_dir)
    }

    /// Get the next field from the multipart stream.
    pub async fn next_field(&mut self) -> Result<Option<multer::Field<'static>>> {
        self.inner.next_field().await.map_err(StorageError::from)
    }

    /// Collect all fields, spooling file fields under the spool directory.
    /// A decode failure midway discards whatever was already spooled before
    /// the error is returned, so a rejected request leaves nothing behind.
    pub async fn collect_all(mut self) -> Result<MultipartData> {
        let mut data = MultipartData::new();

        loop {
            let field = match self.inner.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    data.discard_files().await;
                    return Err(e.into());
                }
            };

            let Some(name) = field.name().map(String::from) else {
                continue;
            };

            if field.file_name().is_some() {
                match SpooledFile::from_field(field, &self.spool_dir).await {
                    Ok(file) => {
                        // A repeated field name supersedes the earlier file.
                        if let Some(old) = data.files.insert(name, file) {
                            old.discard().await;
                        }
                    }
                    Err(e) => {
                        data.discard_files().await;
                        return Err(e);
                    }
                }
            } else {
                match field.text().await {
                    Ok(text) => {
                        data.fields.insert(name, text);
                    }
                    Err(e) => {
                        data.discard_files().await;
                        return Err(e.into());
                    }
                }
            }
        }

        Ok(data)
    }
}

/// An uploaded file written out to the spool directory.
#[derive(Debug)]
pub struct SpooledFile {
    /// Original file name, as sent by the client.
    pub name: Option<String>,
    /// MIME type from the part headers.
    pub content_type: Option<Mime>,
    /// Where the bytes were spooled.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

impl SpooledFile {
    /// Drain a multipart field to disk.
    pub async fn from_field(field: multer::Field<'static>, spool_dir: &Path) -> Result<Self> {
        let name = field.file_name().map(String::from);
        let content_type = field.content_type().cloned();

        let extension = name.as_ref().and_then(|n| {
            Path::new(n)
                .extension()
                .map(|e| e.to_string_lossy().to_string())
        });
        let unique = uuid::Uuid::new_v4();
        let file_name = match &extension {
            Some(ext) => format!("upload-{}.{}", unique, ext),
            None => format!("upload-{}", unique),
        };
        let path = spool_dir.join(file_name);

        let data = field.bytes().await.map_err(StorageError::from)?;
        let size = data.len() as u64;
        fs::write(&path, &data).await?;

        debug!(path = ?path, size, "Spooled upload");

        Ok(Self {
            name,
            content_type,
            path,
            size,
        })
    }

    /// Best-effort removal of the spooled file.
    pub async fn discard(self) {
        if let Err(e) = fs::remove_file(&self.path).await {
            warn!(path = ?self.path, error = %e, "Failed to discard spooled upload");
        }
    }
}

/// Collected multipart data.
#[derive(Debug, Default)]
pub struct MultipartData {
    /// Form fields (non-file fields).
    pub fields: HashMap<String, String>,
    /// Spooled file fields.
    pub files: HashMap<String, SpooledFile>,
}

impl MultipartData {
    /// Create empty multipart data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a form field value.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Get a spooled file.
    pub fn file(&self, name: &str) -> Option<&SpooledFile> {
        self.files.get(name)
    }

    /// Take a spooled file (removes it from the collection).
    pub fn take_file(&mut self, name: &str) -> Option<SpooledFile> {
        self.files.remove(name)
    }

    /// Check if there are any files.
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Discard every spooled file still held. Callers take the files they
    /// want first; whatever remains is unwanted and removed from disk.
    pub async fn discard_files(&mut self) {
        for (_, file) in self.files.drain() {
            file.discard().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body(boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"inventory_name\"\r\n\r\nWidget\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"w.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[1, 2, 3]);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn test_collect_all_spools_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let boundary = "test-boundary";
        let content_type = format!("multipart/form-data; boundary={boundary}");

        let multipart = Multipart::from_bytes(
            &content_type,
            Bytes::from(sample_body(boundary)),
            temp_dir.path(),
        )
        .unwrap();
        let mut data = multipart.collect_all().await.unwrap();

        assert_eq!(data.field("inventory_name"), Some("Widget"));

        let file = data.take_file("photo").unwrap();
        assert_eq!(file.name.as_deref(), Some("w.png"));
        assert_eq!(file.size, 3);
        assert_eq!(std::fs::read(&file.path).unwrap(), vec![1, 2, 3]);
        assert!(file.path.starts_with(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_discard_removes_spooled_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let boundary = "test-boundary";
        let content_type = format!("multipart/form-data; boundary={boundary}");

        let multipart = Multipart::from_bytes(
            &content_type,
            Bytes::from(sample_body(boundary)),
            temp_dir.path(),
        )
        .unwrap();
        let mut data = multipart.collect_all().await.unwrap();

        let file = data.take_file("photo").unwrap();
        let path = file.path.clone();
        assert!(path.exists());

        file.discard().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_discard_files_removes_unwanted_spools() {
        let temp_dir = tempfile::tempdir().unwrap();
        let boundary = "test-boundary";
        let content_type = format!("multipart/form-data; boundary={boundary}");

        let mut body = Vec::new();
        for name in ["photo", "extra"] {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\n\r\ndata\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let multipart =
            Multipart::from_bytes(&content_type, Bytes::from(body), temp_dir.path()).unwrap();
        let mut data = multipart.collect_all().await.unwrap();

        let photo = data.take_file("photo").unwrap();
        data.discard_files().await;

        assert!(photo.path.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_spool_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let boundary = "test-boundary";
        let content_type = format!("multipart/form-data; boundary={boundary}");

        // A complete file part followed by a part the stream cuts off; the
        // first file is spooled before the decoder hits the truncation.
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"p.bin\"\r\n\r\ndata\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"extra\"; filename=\"e.bin\"\r\n\r\nparti"
            )
            .as_bytes(),
        );

        let multipart =
            Multipart::from_bytes(&content_type, Bytes::from(body), temp_dir.path()).unwrap();
        let result = multipart.collect_all().await;

        assert!(matches!(result, Err(StorageError::Multipart(_))));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_boundary_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = Multipart::from_bytes("multipart/form-data", Bytes::new(), temp_dir.path());
        assert!(matches!(result, Err(StorageError::Multipart(_))));
    }
}
