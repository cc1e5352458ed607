//! Input resolution: load user-selected files into in-memory payloads.
//!
//! The browser form hands the request builder `File` objects; the Rust
//! equivalent is a [`FilePayload`] holding the file name, the bytes and a
//! best-effort MIME type. Loading happens before validation; the request
//! builder itself is pure and synchronous.

use crate::error::StegError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// A named binary blob destined for a multipart file field.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct FilePayload {
    /// File name sent in the part's `Content-Disposition`.
    pub name: String,
    /// Raw contents.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Part `Content-Type`.
    pub mime: String,
}

impl std::fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePayload")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime", &self.mime)
            .finish()
    }
}

impl FilePayload {
    /// Wrap in-memory bytes, guessing the MIME type from `name`.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name);
        Self {
            name,
            bytes: bytes.into(),
            mime,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read a file from disk into a [`FilePayload`].
///
/// The payload name is the path's final component, which is what a browser
/// reports as `File.name`.
pub async fn load_payload(path: impl AsRef<Path>) -> Result<FilePayload, StegError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StegError::from_read(path.to_path_buf(), e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(FilePayload::new(name, bytes))
}

/// Guess a part MIME type from a file name's extension.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}

static RE_UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\x00-\x1f<>:"/\\|?*]"#).unwrap());

/// Reduce a user- or server-supplied name to a safe, bare file name.
///
/// Keeps only the final path component, replaces characters that are not
/// allowed in file names with `_`, and never returns an empty string or a
/// dot-only name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = RE_UNSAFE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "carrier".to_string()
    } else {
        cleaned.to_string()
    }
}
