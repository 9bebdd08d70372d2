// Filesystem image store for listing photos.
//
// The Mini App uploads images as base64 (optionally wrapped in a data
// URL). We decode, sniff the real format from magic bytes instead of
// trusting any client-supplied name, cap the size, and write the file
// under the upload directory. The stored name is what goes into
// Listing.images.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use thiserror::Error;
use tokio::fs;

/// Upper bound on a decoded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image payload is not valid base64")]
    BadEncoding,

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("image too large: limit is {0} bytes")]
    TooLarge(usize),

    #[error("bad image name")]
    BadName,

    #[error("storage error: {0}")]
    StorageError(String),
}

pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Decode and persist one uploaded image. Returns the stored file
    /// name; the api layer turns that into a servable path.
    pub async fn save_base64(&self, owner_id: u64, data: &str) -> Result<String, ImageError> {
        // Accept both bare base64 and "data:image/...;base64,..." payloads
        let raw = data
            .split_once("base64,")
            .map(|(_, rest)| rest)
            .unwrap_or(data);

        let bytes = BASE64
            .decode(raw.trim())
            .map_err(|_| ImageError::BadEncoding)?;

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge(MAX_IMAGE_BYTES));
        }

        let ext = sniff_format(&bytes).ok_or(ImageError::UnsupportedFormat)?;
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let name = format!("{}_{}.{}", owner_id, stamp, ext);

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ImageError::StorageError(e.to_string()))?;
        fs::write(self.dir.join(&name), &bytes)
            .await
            .map_err(|e| ImageError::StorageError(e.to_string()))?;

        Ok(name)
    }

    /// Delete a stored image by name. Names with path separators are
    /// rejected so a crafted name cannot reach outside the upload dir.
    pub async fn remove(&self, name: &str) -> Result<(), ImageError> {
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ImageError::BadName);
        }

        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(path)
            .await
            .map_err(|e| ImageError::StorageError(e.to_string()))
    }
}

/// Identify the image format from magic bytes.
fn sniff_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 12 {
        return None;
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }
    if bytes.starts_with(b"GIF8") {
        return Some("gif");
    }
    if bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("webp");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(extra: usize) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend(std::iter::repeat(0u8).take(extra.max(8)));
        bytes
    }

    #[tokio::test]
    async fn test_save_sniffs_format_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let payload = BASE64.encode(png_bytes(32));
        let name = store.save_base64(42, &payload).await.unwrap();

        assert!(name.starts_with("42_"));
        assert!(name.ends_with(".png"));
        assert!(dir.path().join(&name).exists());
    }

    #[tokio::test]
    async fn test_save_accepts_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let payload = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(32)));
        let name = store.save_base64(1, &payload).await.unwrap();
        assert!(name.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_save_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let err = store.save_base64(1, "!!! not base64 !!!").await.unwrap_err();
        assert!(matches!(err, ImageError::BadEncoding));

        let text_payload = BASE64.encode(b"just some text, definitely not an image");
        let err = store.save_base64(1, &text_payload).await.unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let payload = BASE64.encode(png_bytes(MAX_IMAGE_BYTES));
        let err = store.save_base64(1, &payload).await.unwrap_err();
        assert!(matches!(err, ImageError::TooLarge(_)));
    }

    #[tokio::test]
    async fn test_remove_refuses_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let err = store.remove("../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, ImageError::BadName));

        // missing files are fine
        store.remove("nothing_here.png").await.unwrap();
    }
}
