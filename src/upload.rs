//! Uploaded files: extension rules, filename sanitation and request-scoped
//! temp files.

use bytes::Bytes;
use std::path::Path;
use tempfile::TempPath;

/// Longest stem kept from a client filename in the on-disk name.
const MAX_STEM_CHARS: usize = 100;
const MAX_EXTENSION_CHARS: usize = 16;

/// Upload families accepted by the gateway, each with its extension allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Document,
    Audio,
}

impl FileKind {
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            FileKind::Image => &["png", "jpg", "jpeg", "webp"],
            FileKind::Document => &["doc", "docx"],
            FileKind::Audio => &["mp3"],
        }
    }

    /// Whether `filename` carries one of this kind's extensions.
    ///
    /// Only the text after the last `.` counts, compared case-insensitively.
    /// Content is never inspected.
    pub fn accepts(self, filename: &str) -> bool {
        match extension(filename) {
            Some(ext) => self
                .allowed_extensions()
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
            None => false,
        }
    }

    /// Message used when an upload has the wrong extension.
    pub fn invalid_format_message(self) -> String {
        format!(
            "Invalid file format. Allowed extensions: {}",
            self.allowed_extensions().join(", ")
        )
    }
}

fn extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// One file part from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory components are dropped and every character outside
/// `[A-Za-z0-9._-]` becomes `_`. Names that end up empty, hidden or
/// traversal-like fall back to `file`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        return "file".to_string();
    }

    trimmed.to_string()
}

/// Split a sanitized filename into a bounded stem and a bounded extension
/// (with its dot), so the on-disk name stays well under `NAME_MAX`.
fn bounded_name_parts(filename: &str) -> (String, String) {
    let sanitized = sanitize_filename(filename);
    let (stem, ext) = match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (sanitized.as_str(), ""),
    };

    let stem: String = stem.chars().take(MAX_STEM_CHARS).collect();
    let ext: String = ext.chars().take(MAX_EXTENSION_CHARS).collect();
    let suffix = if ext.is_empty() { ext } else { format!(".{ext}") };
    (stem, suffix)
}

/// Write `data` under `dir` as `<stem>-<random><.ext>` for the length of one
/// request.
///
/// The directory is created if missing. The returned [`TempPath`] deletes
/// the file when dropped, on every exit path.
pub async fn persist_upload(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<TempPath> {
    tokio::fs::create_dir_all(dir).await?;

    let (stem, suffix) = bounded_name_parts(filename);
    let path = tempfile::Builder::new()
        .prefix(&format!("{stem}-"))
        .suffix(&suffix)
        .rand_bytes(12)
        .tempfile_in(dir)?
        .into_temp_path();

    // A failed write drops `path`, which removes the partial file.
    tokio::fs::write(&path, data).await?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "Persisted upload");
    Ok(path)
}
