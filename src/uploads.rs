//! Image uploads.
//!
//! `describe` maps an upload to the file it will become without touching the
//! filesystem or HTTP. Stored names are derived from the content, so two
//! uploads only share a file when their bytes are identical. `save` writes the
//! bytes, and `MultipartForm` is the only piece that knows about request bodies.

use axum::extract::Multipart;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::io::AsyncWriteExt;

/// Form field carrying the image, as sent by the client
pub const PICTURE_FIELD: &str = "picture";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Where uploads land and how they are addressed publicly
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_bytes: usize,
}

impl UploadConfig {
    pub fn new(dir: impl Into<PathBuf>, max_file_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_file_bytes,
        }
    }
}

/// A single file taken from a request
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where an upload is (or will be) stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// `<sha256 hex>.<ext>`, persisted as the record's picture path
    pub file_name: String,
    pub path: PathBuf,
}

/// A stored upload and whether this request wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedUpload {
    pub file: StoredFile,
    /// `false` when identical content was already on disk
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    EmptyFile,

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex is valid"))
}

/// Strip directories and unsafe characters from a client-supplied file name
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = unsafe_chars().replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Map an upload to its stored-file descriptor
///
/// Pure: the same config and request always yield the same descriptor. The
/// client's file name only contributes its extension.
pub fn describe(config: &UploadConfig, request: &UploadRequest) -> Result<StoredFile, UploadError> {
    if request.bytes.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    if request.bytes.len() > config.max_file_bytes {
        return Err(UploadError::TooLarge {
            size: request.bytes.len(),
            max: config.max_file_bytes,
        });
    }

    let client_name = sanitize_file_name(&request.original_name)
        .ok_or_else(|| UploadError::InvalidFileName(request.original_name.clone()))?;

    let extension = extension_of(&client_name).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedType(format!(".{}", extension)));
    }
    if let Some(content_type) = &request.content_type {
        if !content_type.starts_with("image/") {
            return Err(UploadError::UnsupportedType(content_type.clone()));
        }
    }

    let file_name = format!("{:x}.{}", Sha256::digest(&request.bytes), extension);

    Ok(StoredFile {
        path: config.dir.join(&file_name),
        file_name,
    })
}

/// Write the upload to its descriptor's path, creating the directory if needed
///
/// Returns `false` without writing when the file already exists; its name
/// pins its content.
pub async fn save(stored: &StoredFile, bytes: &[u8]) -> Result<bool, UploadError> {
    if let Some(parent) = stored.path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&stored.path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            tracing::debug!("Upload {} already stored", stored.file_name);
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        // a partial file would shadow later uploads of the same content
        let _ = tokio::fs::remove_file(&stored.path).await;
        return Err(e.into());
    }

    tracing::info!("Stored upload {} ({} bytes)", stored.file_name, bytes.len());
    Ok(true)
}

/// `describe` followed by `save`
pub async fn store(config: &UploadConfig, request: &UploadRequest) -> Result<SavedUpload, UploadError> {
    let file = describe(config, request)?;
    let created = save(&file, &request.bytes).await?;
    Ok(SavedUpload { file, created })
}

/// Best-effort removal of a file written for a request that later failed
///
/// Files this request did not create may back other records and are kept.
pub async fn discard(saved: &SavedUpload) {
    if !saved.created {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(&saved.file.path).await {
        tracing::warn!("Could not remove orphaned upload {}: {}", saved.file.file_name, e);
    }
}

/// Text fields and files collected from a multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadRequest>,
}

impl MultipartForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(original_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| UploadError::Multipart(e.to_string()))?;

                    // browsers send an empty part when no file was chosen
                    if original_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        UploadRequest {
                            original_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| UploadError::Multipart(e.to_string()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadRequest> {
        self.files.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> UploadConfig {
        UploadConfig::new("public/assets", 1024)
    }

    fn png(name: &str) -> UploadRequest {
        UploadRequest {
            original_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    fn sha256_hex(bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }

    #[test]
    fn test_describe_names_file_by_content() {
        let stored = describe(&config(), &png("avatar.PNG")).unwrap();

        let expected = format!("{}.png", sha256_hex(&[0x89, b'P', b'N', b'G']));
        assert_eq!(stored.file_name, expected);
        assert_eq!(stored.path, PathBuf::from("public/assets").join(&expected));
    }

    #[test]
    fn test_same_client_name_different_bytes_do_not_collide() {
        let first = describe(&config(), &png("photo.png")).unwrap();
        let mut other = png("photo.png");
        other.bytes = b"other image".to_vec();
        let second = describe(&config(), &other).unwrap();

        assert_ne!(first.file_name, second.file_name);
    }

    #[test]
    fn test_client_path_only_contributes_extension() {
        let traversal = describe(&config(), &png("../../etc/passwd.png")).unwrap();
        let windows = describe(&config(), &png("C:\\Users\\me\\photo.png")).unwrap();

        assert_eq!(traversal, windows);
        assert_eq!(traversal.path.parent(), Some(Path::new("public/assets")));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my holiday pic!.png").as_deref(), Some("my_holiday_pic_.png"));
        assert_eq!(sanitize_file_name("../.hidden.png").as_deref(), Some("hidden.png"));
        assert_eq!(sanitize_file_name("..."), None);
    }

    #[test]
    fn test_describe_rejects_bad_input() {
        let mut empty = png("a.png");
        empty.bytes.clear();
        assert!(matches!(describe(&config(), &empty), Err(UploadError::EmptyFile)));

        assert!(matches!(
            describe(&config(), &png("script.js")),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            describe(&config(), &png("..")),
            Err(UploadError::InvalidFileName(_))
        ));

        let mut text = png("notes.png");
        text.content_type = Some("text/plain".to_string());
        assert!(matches!(describe(&config(), &text), Err(UploadError::UnsupportedType(_))));

        let mut big = png("big.png");
        big.bytes = vec![0; 2048];
        assert!(matches!(
            describe(&config(), &big),
            Err(UploadError::TooLarge { size: 2048, max: 1024 })
        ));
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig::new(dir.path().join("assets"), 1024);

        let saved = store(&config, &png("photo.png")).await.unwrap();
        assert!(saved.created);
        let written = tokio::fs::read(&saved.file.path).await.unwrap();
        assert_eq!(written, vec![0x89, b'P', b'N', b'G']);

        discard(&saved).await;
        assert!(!saved.file.path.exists());
    }

    #[tokio::test]
    async fn test_discard_keeps_file_written_by_earlier_upload() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig::new(dir.path(), 1024);

        let first = store(&config, &png("a.png")).await.unwrap();
        let duplicate = store(&config, &png("b.png")).await.unwrap();
        assert_eq!(first.file, duplicate.file);
        assert!(!duplicate.created);

        discard(&duplicate).await;
        assert!(first.file.path.exists());
    }

    proptest! {
        #[test]
        fn prop_describe_never_escapes_upload_dir(name in "[a-zA-Z0-9./\\\\ _-]{1,40}\\.png") {
            if let Ok(stored) = describe(&config(), &png(&name)) {
                prop_assert!(!stored.file_name.contains('/'));
                prop_assert!(!stored.file_name.contains('\\'));
                prop_assert!(!stored.file_name.starts_with('.'));
                prop_assert_eq!(stored.path.parent(), Some(Path::new("public/assets")));
            }
        }

        #[test]
        fn prop_describe_is_deterministic(name in "[a-z]{1,12}\\.(png|jpg|gif)") {
            let a = describe(&config(), &png(&name)).unwrap();
            let b = describe(&config(), &png(&name)).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
