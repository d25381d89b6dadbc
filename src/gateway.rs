//! Upload gateway: extension checks, filename sanitization and per-request
//! staging of uploaded files.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::UploadConfig;

/// Fallback when sanitization leaves nothing usable.
const DEFAULT_FILENAME: &str = "upload";

/// Whether `filename` ends in one of `allowed` (case-insensitive). The
/// extension is whatever follows the last `.`; names without one are refused.
pub fn allowed_file(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Path separators become spaces, only ASCII alphanumerics and `_ . -` are
/// kept, whitespace runs collapse into `_`, and leading or trailing `.`/`_`
/// are trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Owns the working directory that uploads are staged in.
#[derive(Debug, Clone)]
pub struct UploadGateway {
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl UploadGateway {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    /// Create the upload directory if it does not exist yet.
    pub fn ensure_upload_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        allowed_file(filename, &self.allowed_extensions)
    }

    /// Write `bytes` to a path unique to this request. The returned guard
    /// deletes the file when dropped.
    pub async fn stage(&self, filename: &str, bytes: &[u8]) -> std::io::Result<StagedUpload> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let safe_name = sanitize_filename(filename);
        let path = self
            .upload_dir
            .join(format!("{}_{}", Uuid::new_v4(), safe_name));

        let staged = StagedUpload::write(path, bytes).await?;
        tracing::debug!(path = %staged.path.display(), size = bytes.len(), "Upload staged");

        Ok(staged)
    }
}

/// A staged upload on disk, removed when this value goes out of scope.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
}

impl StagedUpload {
    /// Write `bytes` to `path`. The guard owns the path before the write
    /// starts, so a failed or partial write is removed as well.
    async fn write(path: PathBuf, bytes: &[u8]) -> std::io::Result<Self> {
        let staged = StagedUpload { path };
        tokio::fs::write(&staged.path, bytes).await?;
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Staged upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged upload"
            ),
        }
    }
}
