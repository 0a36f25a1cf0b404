//! Uploaded file access for the classifier's file modality.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use notekeeper_core::{defaults, Error, FileReader, Result};

/// MIME type inferred from a file name's extension.
///
/// Unknown extensions map to `image/jpeg`.
pub fn mime_for_path(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        _ => defaults::FALLBACK_MIME_TYPE,
    }
}

/// Reads note files from a directory on local disk.
///
/// Paths are resolved lexically against the root. Absolute paths and paths
/// that climb above the root are reported as missing.
#[derive(Debug, Clone)]
pub struct FsFileReader {
    root: PathBuf,
}

impl FsFileReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path for `relative_path`, or `None` if it escapes the root.
    pub fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        let mut resolved = PathBuf::new();
        for component in Path::new(relative_path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() {
                        return None;
                    }
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if resolved.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(resolved))
    }
}

#[async_trait]
impl FileReader for FsFileReader {
    async fn file_size(&self, relative_path: &str) -> Result<Option<u64>> {
        let Some(path) = self.resolve(relative_path) else {
            warn!(
                subsystem = "inference",
                component = "files",
                path = relative_path,
                "Rejected file path outside upload root"
            );
            return Ok(None);
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn read(&self, relative_path: &str) -> Result<Vec<u8>> {
        let path = self.resolve(relative_path).ok_or_else(|| {
            Error::InvalidInput(format!("Path escapes upload root: {}", relative_path))
        })?;
        Ok(tokio::fs::read(&path).await?)
    }
}
