//! Sources of the known-good reference image.

use std::path::{Path, PathBuf};

use crate::error::{DetectorError, Result};

/// Supplies the encoded bytes of the reference document.
pub trait ReferenceProvider: Send + Sync {
    fn load_reference(&self) -> Result<Vec<u8>>;
}

/// Reads the reference from disk on every call, so a file removed or
/// replaced while the service runs is noticed by the next comparison.
#[derive(Debug, Clone)]
pub struct FsReference {
    path: PathBuf,
}

impl FsReference {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceProvider for FsReference {
    fn load_reference(&self) -> Result<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DetectorError::ReferenceMissing),
            Err(e) => Err(DetectorError::Io(e)),
        }
    }
}

/// Reference held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    bytes: Option<Vec<u8>>,
}

impl InMemoryReference {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// A provider that behaves like an unprovisioned deployment.
    pub fn missing() -> Self {
        Self { bytes: None }
    }
}

impl ReferenceProvider for InMemoryReference {
    fn load_reference(&self) -> Result<Vec<u8>> {
        self.bytes.clone().ok_or(DetectorError::ReferenceMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_reference_missing() {
        let temp_dir = TempDir::new().unwrap();
        let provider = FsReference::new(temp_dir.path().join("reference_pan_card.png"));
        assert!(matches!(provider.load_reference(), Err(DetectorError::ReferenceMissing)));
    }

    #[test]
    fn test_fs_reference_reads_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reference_pan_card.png");
        std::fs::write(&path, b"bytes").unwrap();

        let provider = FsReference::new(&path);
        assert_eq!(provider.load_reference().unwrap(), b"bytes");
        assert_eq!(provider.path(), path.as_path());
    }

    #[test]
    fn test_in_memory_reference() {
        assert_eq!(InMemoryReference::new(vec![1, 2]).load_reference().unwrap(), vec![1, 2]);
        assert!(matches!(
            InMemoryReference::missing().load_reference(),
            Err(DetectorError::ReferenceMissing)
        ));
    }
}
